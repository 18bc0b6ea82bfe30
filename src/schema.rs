//! Response schemas for the two model calls.
//!
//! Schemas use Gemini's OpenAPI subset (`"type": "OBJECT"`, `"STRING"`).
//! Property names are exactly the JSON field names of the matching
//! [`DocumentData`](crate::models::DocumentData) variant.

use serde_json::{json, Map, Value};

use crate::models::DocType;

/// Schema for the classification call: a single required `tipoDocumento`.
pub fn identification_schema() -> Value {
    let labels: Vec<String> = DocType::ALL
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "tipoDocumento": {
                "type": "STRING",
                "description": format!(
                    "Classifique o tipo de documento. Respostas válidas: {}.",
                    labels.join(", ")
                ),
            }
        },
        "required": ["tipoDocumento"],
    })
}

/// Schema for the extraction call, or `None` for [`DocType::Desconhecido`].
pub fn extraction_schema(doc_type: DocType) -> Option<Value> {
    let (properties, required) = match doc_type {
        DocType::Rg => (RG_PROPERTIES, RG_REQUIRED),
        DocType::Cnh => (CNH_PROPERTIES, CNH_REQUIRED),
        DocType::ComprovanteEndereco => (ENDERECO_PROPERTIES, ENDERECO_REQUIRED),
        DocType::Procuracao => (PROCURACAO_PROPERTIES, PROCURACAO_REQUIRED),
        DocType::Escritura => (ESCRITURA_PROPERTIES, ESCRITURA_REQUIRED),
        DocType::Estatuto => (ESTATUTO_PROPERTIES, ESTATUTO_REQUIRED),
        DocType::Ata => (ATA_PROPERTIES, ATA_REQUIRED),
        DocType::Desconhecido => return None,
    };

    Some(object_schema(properties, required))
}

fn object_schema(properties: &[(&str, Option<&str>)], required: &[&str]) -> Value {
    let mut props = Map::new();
    for (name, description) in properties {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!("STRING"));
        if let Some(description) = description {
            prop.insert("description".to_string(), json!(description));
        }
        props.insert(name.to_string(), Value::Object(prop));
    }
    json!({
        "type": "OBJECT",
        "properties": props,
        "required": required,
    })
}

const RG_REQUIRED: &[&str] = &["nome", "rg", "cpf"];
const CNH_REQUIRED: &[&str] = &["nome", "cpf", "numeroRegistroCNH"];
const ENDERECO_REQUIRED: &[&str] = &["destinatario", "logradouro", "cidade", "cep"];
const PROCURACAO_REQUIRED: &[&str] = &["outorganteNome", "outorgadoNome", "poderes"];
const ESCRITURA_REQUIRED: &[&str] = &["vendedorNome", "compradorNome", "descricaoImovel"];
const ESTATUTO_REQUIRED: &[&str] = &[
    "razaoSocial",
    "tipoOrganizacao",
    "sedeEndereco",
    "objetoSocial",
    "representanteLegal",
];
const ATA_REQUIRED: &[&str] = &[
    "nomeOrganizacao",
    "tipoAta",
    "dataReuniao",
    "localReuniao",
    "pauta",
];

type Properties = &'static [(&'static str, Option<&'static str>)];

const RG_PROPERTIES: Properties = &[
    ("nome", None),
    ("filiacaoMae", None),
    ("filiacaoPai", None),
    ("dataNascimento", None),
    ("naturalidade", None),
    ("rg", None),
    ("cpf", None),
    ("dataEmissao", None),
    ("orgaoEmissorUF", None),
];

const CNH_PROPERTIES: Properties = &[
    ("nome", None),
    ("filiacaoMae", None),
    ("filiacaoPai", None),
    ("dataNascimento", None),
    ("rg", None),
    ("cpf", None),
    ("dataEmissao", None),
    ("orgaoEmissorUF", None),
    ("numeroRegistroCNH", None),
    ("dataValidade", None),
    ("categoriaHabilitacao", None),
];

const ENDERECO_PROPERTIES: Properties = &[
    ("destinatario", None),
    ("logradouro", None),
    ("numero", None),
    ("bairro", None),
    ("cidade", None),
    ("estado", None),
    ("cep", None),
    ("dataEmissaoConta", None),
];

const PROCURACAO_PROPERTIES: Properties = &[
    (
        "outorganteNome",
        Some("Nome completo do Outorgante (quem dá os poderes)"),
    ),
    ("outorganteCpf", Some("CPF/CNPJ do Outorgante")),
    (
        "outorgadoNome",
        Some("Nome completo do Outorgado (quem recebe os poderes)"),
    ),
    ("outorgadoCpf", Some("CPF/CNPJ do Outorgado")),
    ("poderes", Some("Um resumo breve dos poderes concedidos")),
    (
        "localData",
        Some("Local e data de assinatura (ex: 'São Paulo, 01 de Janeiro de 2025')"),
    ),
];

const ESCRITURA_PROPERTIES: Properties = &[
    (
        "vendedorNome",
        Some("Nome completo do Vendedor/Transmitente"),
    ),
    ("vendedorCpf", Some("CPF/CNPJ do Vendedor")),
    (
        "compradorNome",
        Some("Nome completo do Comprador/Adquirente"),
    ),
    ("compradorCpf", Some("CPF/CNPJ do Comprador")),
    (
        "descricaoImovel",
        Some("Descrição breve do imóvel (ex: 'Lote 10, Quadra 5...')"),
    ),
    (
        "valorTransacao",
        Some("Valor da transação (ex: 'R$ 500.000,00')"),
    ),
];

const ESTATUTO_PROPERTIES: Properties = &[
    (
        "razaoSocial",
        Some("Nome empresarial completo (Razão Social) da organização."),
    ),
    (
        "tipoOrganizacao",
        Some("Tipo de entidade (ex: 'Organização Religiosa', 'Associação Civil', 'Fundação')."),
    ),
    (
        "dataFundacao",
        Some("Data de fundação da organização (ex: '12 de outubro de 2024')."),
    ),
    (
        "sedeEndereco",
        Some("Endereço completo da sede (Rua, Nº, Bairro, CEP, Cidade, UF)."),
    ),
    ("duracao", Some("Prazo de duração (ex: 'Indeterminado').")),
    (
        "objetoSocial",
        Some("Resumo dos objetivos e finalidades da organização."),
    ),
    (
        "representanteLegal",
        Some("Nome completo do Representante Legal (ex: 'Primeiro Presidente')."),
    ),
    (
        "membrosDiretoria",
        Some("Lista dos membros da diretoria, seus cargos e mandatos (ex: 'Maria Elza - 1ª Presidente (Indeterminado), Cícero Cunha - 2º Presidente (Indeterminado)...')."),
    ),
    (
        "clausulaReforma",
        Some("Resumo da regra para reformar o estatuto (ex: '2/3 dos membros em Assembleia Geral Extraordinária')."),
    ),
    (
        "clausulaDissolucao",
        Some("Resumo da regra de dissolução e destino do patrimônio."),
    ),
];

const ATA_PROPERTIES: Properties = &[
    (
        "nomeOrganizacao",
        Some("Nome da entidade/organização que está realizando a reunião."),
    ),
    (
        "tipoAta",
        Some("Tipo da Ata (ex: 'Ata de Fundação', 'Ata de Assembleia Geral Ordinária')."),
    ),
    (
        "dataReuniao",
        Some("Data e hora da reunião (ex: '12 de outubro de 2024, às 20h')."),
    ),
    (
        "localReuniao",
        Some("Endereço completo onde a reunião ocorreu."),
    ),
    ("presidenteAta", Some("Nome de quem presidiu a reunião.")),
    ("secretarioAta", Some("Nome de quem secretariou a reunião.")),
    (
        "pauta",
        Some("Resumo dos objetivos/pauta da reunião (ex: 'Eleição da diretoria, aprovação do estatuto...')."),
    ),
    ("deliberacoes", Some("Resumo das principais decisões tomadas.")),
    (
        "membrosEleitos",
        Some("Lista de membros eleitos, seus cargos e mandatos (ex: 1ª Presidente (Indeterminado), 2º Presidente."),
    ),
    (
        "signatarios",
        Some("Lista dos nomes dos principais signatários (ex: 'Presidente, Secretário, Advogado')."),
    ),
];
