use regex::Regex;
use std::sync::LazyLock;

/// Caracteres preservados pela normalização de descrições.
///
/// Tudo que não for letra ASCII minúscula, dígito, espaço em branco ou
/// caractere latino acentuado no intervalo `à..=ú` (U+00E0..=U+00FA) é removido.
/// Os separadores ASCII U+001C..=U+001F contam como espaço em branco.
pub static RE_CARACTERES_DESCARTADOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s\x1c-\x1fà-ú]").unwrap());

/// Linhas de título de seção nas listas municipais.
///
/// Ex: `1. Serviços de informática e congêneres.`
pub static RE_TITULO_DE_SECAO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

/// Extensões de planilha aceitas pela leitura via calamine.
pub static RE_EXTENSAO_PLANILHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(xlsx|xlsm|xlsb|xls|ods)$").unwrap());

pub static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());
