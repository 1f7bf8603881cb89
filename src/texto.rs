use std::collections::HashSet;

use crate::RE_CARACTERES_DESCARTADOS;

/// Normaliza uma descrição de serviço para comparação.
///
/// Converte para minúsculas e remove pontuação, símbolos e demais caracteres
/// fora de `[a-z0-9\sà-ú]`. Os separadores ASCII U+001C..=U+001F também
/// contam como espaço e são preservados. Espaços não são colapsados: a tokenização
/// posterior divide o texto em qualquer sequência de espaços.
///
/// ### Exemplo
/// ```
/// use mapear_servicos_nbs::limpar_texto;
///
/// assert_eq!(limpar_texto("Análise, Desenvolvimento (Sistemas)!"), "análise desenvolvimento sistemas");
/// assert_eq!(limpar_texto("Serviço nº 7.01"), "serviço n 701");
/// ```
pub fn limpar_texto(texto: &str) -> String {
    let minusculo = texto.to_lowercase();
    RE_CARACTERES_DESCARTADOS
        .replace_all(&minusculo, "")
        .into_owned()
}

/// Divide o texto normalizado em um conjunto de palavras (tokens).
///
/// Separa em espaços em branco e nos separadores de informação ASCII
/// (U+001C..=U+001F). Palavras repetidas colapsam e a ordem é irrelevante.
pub fn tokenizar(texto_limpo: &str) -> HashSet<String> {
    texto_limpo
        .split(separador)
        .filter(|palavra| !palavra.is_empty())
        .map(String::from)
        .collect()
}

fn separador(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}
