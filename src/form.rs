//! Type-specific form layout for reviewing extracted data.
//!
//! The browser UI and the CLI render the same [`FieldDescriptor`] lists, so
//! which fields appear for which document type is decided here, once.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{DocType, DocumentData};

/// One editable field of the review form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// JSON field name in [`DocumentData`].
    pub key: &'static str,
    pub label: &'static str,
    pub section: &'static str,
    /// Rendered as a textarea instead of a single-line input.
    pub multiline: bool,
}

/// A descriptor paired with the record's current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
    pub value: String,
}

/// Everything the UI needs to render the review form for one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub tipo_documento: DocType,
    pub label: &'static str,
    pub fields: Vec<FormField>,
}

const fn field(
    key: &'static str,
    label: &'static str,
    section: &'static str,
    multiline: bool,
) -> FieldDescriptor {
    FieldDescriptor {
        key,
        label,
        section,
        multiline,
    }
}

const PESSOAIS: &str = "Dados Pessoais";
const DOCUMENTO: &str = "Dados do Documento";
const ENDERECO: &str = "Dados de Endereço";
const OUTORGANTE: &str = "Outorgante";
const OUTORGADO: &str = "Outorgado";
const VENDEDOR: &str = "Vendedor";
const COMPRADOR: &str = "Comprador";
const IMOVEL: &str = "Imóvel e Transação";
const ORGANIZACAO: &str = "Dados da Organização";
const DIRETORIA: &str = "Diretoria e Cláusulas";
const REUNIAO: &str = "Dados da Reunião";
const CONTEUDO: &str = "Conteúdo da Ata";

const IDENTITY_FIELDS: [FieldDescriptor; 8] = [
    field("nome", "Nome Completo", PESSOAIS, false),
    field("filiacaoMae", "Nome da Mãe", PESSOAIS, false),
    field("filiacaoPai", "Nome do Pai", PESSOAIS, false),
    field("dataNascimento", "Data de Nascimento", PESSOAIS, false),
    field("cpf", "CPF", DOCUMENTO, false),
    field("rg", "RG", DOCUMENTO, false),
    field("dataEmissao", "Data de Emissão", DOCUMENTO, false),
    field("orgaoEmissorUF", "Órgão Emissor / UF", DOCUMENTO, false),
];

const RG_EXTRA: [FieldDescriptor; 1] = [field(
    "naturalidade",
    "Naturalidade (Cidade/UF)",
    "Informações Adicionais (RG)",
    false,
)];

const CNH_EXTRA: [FieldDescriptor; 3] = [
    field(
        "numeroRegistroCNH",
        "Nº Registro CNH / RENACH",
        "Informações da CNH",
        false,
    ),
    field("dataValidade", "Data de Validade", "Informações da CNH", false),
    field("categoriaHabilitacao", "Categoria", "Informações da CNH", false),
];

const ENDERECO_FIELDS: [FieldDescriptor; 8] = [
    field("destinatario", "Destinatário", ENDERECO, false),
    field("logradouro", "Logradouro (Rua/Av)", ENDERECO, false),
    field("numero", "Número", ENDERECO, false),
    field("cep", "CEP", ENDERECO, false),
    field("bairro", "Bairro", ENDERECO, false),
    field("cidade", "Cidade", ENDERECO, false),
    field("estado", "Estado (UF)", ENDERECO, false),
    field("dataEmissaoConta", "Data de Emissão da Conta", ENDERECO, false),
];

const PROCURACAO_FIELDS: [FieldDescriptor; 6] = [
    field("outorganteNome", "Nome do Outorgante", OUTORGANTE, false),
    field("outorganteCpf", "CPF/CNPJ do Outorgante", OUTORGANTE, false),
    field("outorgadoNome", "Nome do Outorgado", OUTORGADO, false),
    field("outorgadoCpf", "CPF/CNPJ do Outorgado", OUTORGADO, false),
    field("poderes", "Poderes Concedidos", "Poderes", true),
    field("localData", "Local e Data", "Poderes", false),
];

const ESCRITURA_FIELDS: [FieldDescriptor; 6] = [
    field("vendedorNome", "Nome do Vendedor", VENDEDOR, false),
    field("vendedorCpf", "CPF/CNPJ do Vendedor", VENDEDOR, false),
    field("compradorNome", "Nome do Comprador", COMPRADOR, false),
    field("compradorCpf", "CPF/CNPJ do Comprador", COMPRADOR, false),
    field("descricaoImovel", "Descrição do Imóvel", IMOVEL, true),
    field("valorTransacao", "Valor da Transação", IMOVEL, false),
];

const ESTATUTO_FIELDS: [FieldDescriptor; 10] = [
    field("razaoSocial", "Razão Social", ORGANIZACAO, false),
    field("tipoOrganizacao", "Tipo de Organização", ORGANIZACAO, false),
    field("dataFundacao", "Data de Fundação", ORGANIZACAO, false),
    field("sedeEndereco", "Endereço da Sede", ORGANIZACAO, false),
    field("duracao", "Duração", ORGANIZACAO, false),
    field("objetoSocial", "Objeto Social", ORGANIZACAO, true),
    field("representanteLegal", "Representante Legal", DIRETORIA, false),
    field("membrosDiretoria", "Membros da Diretoria", DIRETORIA, true),
    field("clausulaReforma", "Cláusula de Reforma", DIRETORIA, true),
    field("clausulaDissolucao", "Cláusula de Dissolução", DIRETORIA, true),
];

const ATA_FIELDS: [FieldDescriptor; 10] = [
    field("nomeOrganizacao", "Nome da Organização", REUNIAO, false),
    field("tipoAta", "Tipo de Ata", REUNIAO, false),
    field("dataReuniao", "Data da Reunião", REUNIAO, false),
    field("localReuniao", "Local da Reunião", REUNIAO, false),
    field("presidenteAta", "Presidente", REUNIAO, false),
    field("secretarioAta", "Secretário", REUNIAO, false),
    field("pauta", "Pauta", CONTEUDO, true),
    field("deliberacoes", "Deliberações", CONTEUDO, true),
    field("membrosEleitos", "Membros Eleitos", CONTEUDO, true),
    field("signatarios", "Signatários", CONTEUDO, true),
];

/// Fields rendered for a document type, in display order.
pub fn form_fields(doc_type: DocType) -> Vec<FieldDescriptor> {
    match doc_type {
        DocType::Rg => [&IDENTITY_FIELDS[..], &RG_EXTRA[..]].concat(),
        DocType::Cnh => [&IDENTITY_FIELDS[..], &CNH_EXTRA[..]].concat(),
        DocType::ComprovanteEndereco => ENDERECO_FIELDS.to_vec(),
        DocType::Procuracao => PROCURACAO_FIELDS.to_vec(),
        DocType::Escritura => ESCRITURA_FIELDS.to_vec(),
        DocType::Estatuto => ESTATUTO_FIELDS.to_vec(),
        DocType::Ata => ATA_FIELDS.to_vec(),
        DocType::Desconhecido => Vec::new(),
    }
}

pub fn form_view(data: &DocumentData) -> FormView {
    let doc_type = data.doc_type();
    let fields = form_fields(doc_type)
        .into_iter()
        .map(|descriptor| FormField {
            value: data.get(descriptor.key).unwrap_or_default().to_string(),
            descriptor,
        })
        .collect();
    FormView {
        tipo_documento: doc_type,
        label: doc_type.label(),
        fields,
    }
}

/// Applies edited form values. All keys are checked before any is written,
/// so a rejected update leaves `data` unchanged.
pub fn apply_updates(data: &mut DocumentData, updates: &BTreeMap<String, String>) -> Result<()> {
    if let Some(bad) = updates.keys().find(|k| data.get(k).is_none()) {
        anyhow::bail!(
            "invalid field '{}' for document type {}",
            bad,
            data.doc_type()
        );
    }
    for (key, value) in updates {
        data.set(key, value.clone())?;
    }
    Ok(())
}

/// Plain-text rendering for the terminal, grouped by section.
pub fn render_text(data: &DocumentData) -> String {
    let view = form_view(data);
    let mut out = String::new();
    let _ = writeln!(out, "Tipo de Documento: {} ({})", view.label, view.tipo_documento);

    let mut current_section = "";
    for f in &view.fields {
        if f.descriptor.section != current_section {
            current_section = f.descriptor.section;
            let _ = writeln!(out, "\n  {}", current_section);
        }
        let value = if f.value.is_empty() { "—" } else { f.value.as_str() };
        let _ = writeln!(out, "    {}: {}", f.descriptor.label, value);
    }
    out
}
