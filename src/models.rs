//! Document types and the per-type extracted data.
//!
//! [`DocumentData`] is a tagged union on the `tipoDocumento` JSON field. Each
//! variant carries a flat struct of string fields whose JSON names match the
//! property names of the extraction schemas in [`crate::schema`].

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse document label returned by the classification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum DocType {
    #[serde(rename = "RG")]
    Rg,
    #[serde(rename = "CNH")]
    Cnh,
    #[serde(rename = "COMPROVANTE_ENDERECO")]
    ComprovanteEndereco,
    #[serde(rename = "PROCURACAO")]
    Procuracao,
    #[serde(rename = "ESCRITURA")]
    Escritura,
    #[serde(rename = "ESTATUTO")]
    Estatuto,
    #[serde(rename = "ATA")]
    Ata,
    #[serde(rename = "DESCONHECIDO")]
    Desconhecido,
}

impl DocType {
    pub const ALL: [DocType; 8] = [
        DocType::Rg,
        DocType::Cnh,
        DocType::ComprovanteEndereco,
        DocType::Procuracao,
        DocType::Escritura,
        DocType::Estatuto,
        DocType::Ata,
        DocType::Desconhecido,
    ];

    /// Wire label, as sent to and received from the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Rg => "RG",
            DocType::Cnh => "CNH",
            DocType::ComprovanteEndereco => "COMPROVANTE_ENDERECO",
            DocType::Procuracao => "PROCURACAO",
            DocType::Escritura => "ESCRITURA",
            DocType::Estatuto => "ESTATUTO",
            DocType::Ata => "ATA",
            DocType::Desconhecido => "DESCONHECIDO",
        }
    }

    /// Human-readable name shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            DocType::Rg => "Carteira de Identidade (RG)",
            DocType::Cnh => "Carteira Nacional de Habilitação (CNH)",
            DocType::ComprovanteEndereco => "Comprovante de Endereço",
            DocType::Procuracao => "Procuração",
            DocType::Escritura => "Escritura",
            DocType::Estatuto => "Estatuto Social",
            DocType::Ata => "Ata de Reunião",
            DocType::Desconhecido => "Desconhecido",
        }
    }

    /// Lenient mapping of a model-produced label.
    ///
    /// Case and separators are ignored. Anything unrecognised becomes
    /// [`DocType::Desconhecido`].
    pub fn from_label(label: &str) -> DocType {
        let normalized: String = label
            .trim()
            .to_uppercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        DocType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .unwrap_or(DocType::Desconhecido)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DocType {
    fn from(s: String) -> Self {
        DocType::from_label(&s)
    }
}

/// Strict parsing, used for user input such as `--doc-type`.
impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        DocType::ALL
            .iter()
            .find(|t| t.as_str() == upper)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = DocType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown document type '{}'; valid: {}", s, valid.join(", "))
            })
    }
}

/// Accepts whatever JSON scalar the model returns for a text field.
///
/// `null` becomes an empty string, numbers and booleans are stringified, and
/// arrays (lists of board members, signatories) are joined with `", "`.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(value_to_text).unwrap_or_default())
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

macro_rules! document_fields {
    ($(#[$meta:meta])* $name:ident { $($field:ident => $json:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                #[serde(rename = $json, deserialize_with = "lenient_string")]
                pub $field: String,
            )*
        }

        impl $name {
            /// JSON field names, in form order.
            pub const FIELDS: &'static [&'static str] = &[$($json),*];

            fn field(&self, key: &str) -> Option<&str> {
                match key {
                    $($json => Some(&self.$field),)*
                    _ => None,
                }
            }

            fn field_mut(&mut self, key: &str) -> Option<&mut String> {
                match key {
                    $($json => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

document_fields!(
    /// Carteira de Identidade.
    RgData {
        nome => "nome",
        filiacao_mae => "filiacaoMae",
        filiacao_pai => "filiacaoPai",
        data_nascimento => "dataNascimento",
        naturalidade => "naturalidade",
        rg => "rg",
        cpf => "cpf",
        data_emissao => "dataEmissao",
        orgao_emissor_uf => "orgaoEmissorUF",
    }
);

document_fields!(
    /// Carteira Nacional de Habilitação.
    CnhData {
        nome => "nome",
        filiacao_mae => "filiacaoMae",
        filiacao_pai => "filiacaoPai",
        data_nascimento => "dataNascimento",
        rg => "rg",
        cpf => "cpf",
        data_emissao => "dataEmissao",
        orgao_emissor_uf => "orgaoEmissorUF",
        numero_registro_cnh => "numeroRegistroCNH",
        data_validade => "dataValidade",
        categoria_habilitacao => "categoriaHabilitacao",
    }
);

document_fields!(
    /// Proof of residence (utility bill and similar).
    EnderecoData {
        destinatario => "destinatario",
        logradouro => "logradouro",
        numero => "numero",
        bairro => "bairro",
        cidade => "cidade",
        estado => "estado",
        cep => "cep",
        data_emissao_conta => "dataEmissaoConta",
    }
);

document_fields!(
    /// Power of attorney.
    ProcuracaoData {
        outorgante_nome => "outorganteNome",
        outorgante_cpf => "outorganteCpf",
        outorgado_nome => "outorgadoNome",
        outorgado_cpf => "outorgadoCpf",
        poderes => "poderes",
        local_data => "localData",
    }
);

document_fields!(
    /// Property deed.
    EscrituraData {
        vendedor_nome => "vendedorNome",
        vendedor_cpf => "vendedorCpf",
        comprador_nome => "compradorNome",
        comprador_cpf => "compradorCpf",
        descricao_imovel => "descricaoImovel",
        valor_transacao => "valorTransacao",
    }
);

document_fields!(
    /// Organisation bylaws.
    EstatutoData {
        razao_social => "razaoSocial",
        tipo_organizacao => "tipoOrganizacao",
        data_fundacao => "dataFundacao",
        sede_endereco => "sedeEndereco",
        duracao => "duracao",
        objeto_social => "objetoSocial",
        representante_legal => "representanteLegal",
        membros_diretoria => "membrosDiretoria",
        clausula_reforma => "clausulaReforma",
        clausula_dissolucao => "clausulaDissolucao",
    }
);

document_fields!(
    /// Meeting minutes.
    AtaData {
        nome_organizacao => "nomeOrganizacao",
        tipo_ata => "tipoAta",
        data_reuniao => "dataReuniao",
        local_reuniao => "localReuniao",
        presidente_ata => "presidenteAta",
        secretario_ata => "secretarioAta",
        pauta => "pauta",
        deliberacoes => "deliberacoes",
        membros_eleitos => "membrosEleitos",
        signatarios => "signatarios",
    }
);

/// Extracted fields of one document, discriminated by `tipoDocumento`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipoDocumento")]
pub enum DocumentData {
    #[serde(rename = "RG")]
    Rg(RgData),
    #[serde(rename = "CNH")]
    Cnh(CnhData),
    #[serde(rename = "COMPROVANTE_ENDERECO")]
    ComprovanteEndereco(EnderecoData),
    #[serde(rename = "PROCURACAO")]
    Procuracao(ProcuracaoData),
    #[serde(rename = "ESCRITURA")]
    Escritura(EscrituraData),
    #[serde(rename = "ESTATUTO")]
    Estatuto(EstatutoData),
    #[serde(rename = "ATA")]
    Ata(AtaData),
    #[serde(rename = "DESCONHECIDO")]
    Desconhecido,
}

impl DocumentData {
    pub fn doc_type(&self) -> DocType {
        match self {
            DocumentData::Rg(_) => DocType::Rg,
            DocumentData::Cnh(_) => DocType::Cnh,
            DocumentData::ComprovanteEndereco(_) => DocType::ComprovanteEndereco,
            DocumentData::Procuracao(_) => DocType::Procuracao,
            DocumentData::Escritura(_) => DocType::Escritura,
            DocumentData::Estatuto(_) => DocType::Estatuto,
            DocumentData::Ata(_) => DocType::Ata,
            DocumentData::Desconhecido => DocType::Desconhecido,
        }
    }

    /// Empty record of the given type.
    #[cfg(test)]
    pub(crate) fn empty(doc_type: DocType) -> DocumentData {
        match doc_type {
            DocType::Rg => DocumentData::Rg(RgData::default()),
            DocType::Cnh => DocumentData::Cnh(CnhData::default()),
            DocType::ComprovanteEndereco => {
                DocumentData::ComprovanteEndereco(EnderecoData::default())
            }
            DocType::Procuracao => DocumentData::Procuracao(ProcuracaoData::default()),
            DocType::Escritura => DocumentData::Escritura(EscrituraData::default()),
            DocType::Estatuto => DocumentData::Estatuto(EstatutoData::default()),
            DocType::Ata => DocumentData::Ata(AtaData::default()),
            DocType::Desconhecido => DocumentData::Desconhecido,
        }
    }

    /// JSON field names carried by a document type.
    pub fn field_names(doc_type: DocType) -> &'static [&'static str] {
        match doc_type {
            DocType::Rg => RgData::FIELDS,
            DocType::Cnh => CnhData::FIELDS,
            DocType::ComprovanteEndereco => EnderecoData::FIELDS,
            DocType::Procuracao => ProcuracaoData::FIELDS,
            DocType::Escritura => EscrituraData::FIELDS,
            DocType::Estatuto => EstatutoData::FIELDS,
            DocType::Ata => AtaData::FIELDS,
            DocType::Desconhecido => &[],
        }
    }

    /// Current value of a field, or `None` if the type has no such field.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            DocumentData::Rg(d) => d.field(key),
            DocumentData::Cnh(d) => d.field(key),
            DocumentData::ComprovanteEndereco(d) => d.field(key),
            DocumentData::Procuracao(d) => d.field(key),
            DocumentData::Escritura(d) => d.field(key),
            DocumentData::Estatuto(d) => d.field(key),
            DocumentData::Ata(d) => d.field(key),
            DocumentData::Desconhecido => None,
        }
    }

    /// Overwrites one field. Fails if the document type has no such field.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let doc_type = self.doc_type();
        let slot = match self {
            DocumentData::Rg(d) => d.field_mut(key),
            DocumentData::Cnh(d) => d.field_mut(key),
            DocumentData::ComprovanteEndereco(d) => d.field_mut(key),
            DocumentData::Procuracao(d) => d.field_mut(key),
            DocumentData::Escritura(d) => d.field_mut(key),
            DocumentData::Estatuto(d) => d.field_mut(key),
            DocumentData::Ata(d) => d.field_mut(key),
            DocumentData::Desconhecido => None,
        };
        match slot {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => bail!("invalid field '{}' for document type {}", key, doc_type),
        }
    }

    /// Builds a record from the extraction call's JSON object.
    ///
    /// The classification result is authoritative: any `tipoDocumento`
    /// the model echoes back is overwritten with `doc_type`.
    pub fn from_extraction(doc_type: DocType, value: serde_json::Value) -> Result<DocumentData> {
        let mut object = match value {
            serde_json::Value::Object(map) => map,
            other => bail!(
                "expected a JSON object from the extraction call, got: {}",
                other
            ),
        };
        object.insert(
            "tipoDocumento".to_string(),
            serde_json::Value::String(doc_type.as_str().to_string()),
        );
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn doc_type_wire_labels() {
        assert_eq!(
            serde_json::to_value(DocType::ComprovanteEndereco).unwrap(),
            json!("COMPROVANTE_ENDERECO")
        );
        let parsed: DocType = serde_json::from_value(json!("cnh")).unwrap();
        assert_eq!(parsed, DocType::Cnh);
    }

    #[test]
    fn unknown_label_maps_to_desconhecido() {
        assert_eq!(DocType::from_label("PASSAPORTE"), DocType::Desconhecido);
        assert_eq!(DocType::from_label(""), DocType::Desconhecido);
        let parsed: DocType = serde_json::from_value(json!("boleto")).unwrap();
        assert_eq!(parsed, DocType::Desconhecido);
    }

    #[test]
    fn separators_are_normalised_but_words_are_not_guessed() {
        assert_eq!(
            DocType::from_label(" comprovante endereco "),
            DocType::ComprovanteEndereco
        );
        assert_eq!(
            DocType::from_label("ATA_DE_POSSE_DO_PRESIDENTE"),
            DocType::Desconhecido
        );
        assert_eq!(
            DocType::from_label("Comprovante de Residência"),
            DocType::Desconhecido
        );
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!("ata".parse::<DocType>().unwrap(), DocType::Ata);
        let err = "passaporte".parse::<DocType>().unwrap_err();
        assert!(err.contains("unknown document type"));
    }

    #[test]
    fn extraction_overrides_echoed_type() {
        let data = DocumentData::from_extraction(
            DocType::Rg,
            json!({"tipoDocumento": "CNH", "nome": "Maria Silva", "cpf": "123.456.789-00"}),
        )
        .unwrap();
        assert_eq!(data.doc_type(), DocType::Rg);
        assert_eq!(data.get("nome"), Some("Maria Silva"));
        assert_eq!(data.get("naturalidade"), Some(""));
    }

    #[test]
    fn extraction_tolerates_nulls_numbers_and_lists() {
        let data = DocumentData::from_extraction(
            DocType::Estatuto,
            json!({
                "razaoSocial": "Igreja Vida Nova",
                "duracao": null,
                "dataFundacao": 2024,
                "membrosDiretoria": ["Maria Elza - 1ª Presidente", "Cícero Cunha - 2º Presidente"]
            }),
        )
        .unwrap();
        assert_eq!(data.get("duracao"), Some(""));
        assert_eq!(data.get("dataFundacao"), Some("2024"));
        assert_eq!(
            data.get("membrosDiretoria"),
            Some("Maria Elza - 1ª Presidente, Cícero Cunha - 2º Presidente")
        );
    }

    #[test]
    fn extraction_rejects_non_object() {
        let err = DocumentData::from_extraction(DocType::Ata, json!(["nope"])).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn serializes_with_tag_and_camel_case_names() {
        let mut data = DocumentData::empty(DocType::Cnh);
        data.set("numeroRegistroCNH", "01234567890").unwrap();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["tipoDocumento"], "CNH");
        assert_eq!(value["numeroRegistroCNH"], "01234567890");
        assert_eq!(value["orgaoEmissorUF"], "");

        let unknown = serde_json::to_value(DocumentData::Desconhecido).unwrap();
        assert_eq!(unknown, json!({"tipoDocumento": "DESCONHECIDO"}));
    }

    #[test]
    fn set_rejects_fields_of_other_types() {
        let mut data = DocumentData::empty(DocType::Rg);
        let err = data.set("cep", "01001-000").unwrap_err();
        assert!(err.to_string().contains("invalid field 'cep'"));
        assert!(DocumentData::Desconhecido.clone().set("nome", "x").is_err());
    }

    #[test]
    fn field_names_match_serialized_keys() {
        for doc_type in DocType::ALL {
            let value = serde_json::to_value(DocumentData::empty(doc_type)).unwrap();
            let object = value.as_object().unwrap();
            let names = DocumentData::field_names(doc_type);
            assert_eq!(object.len(), names.len() + 1, "{}", doc_type);
            for name in names {
                assert!(object.contains_key(*name), "{} missing {}", doc_type, name);
            }
        }
    }
}
