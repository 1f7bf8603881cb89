use std::collections::{HashMap, HashSet};

use crate::{RegistroServico, limpar_texto, tokenizar};

/// Linha da tabela de referência (NBS) com as palavras já normalizadas.
///
/// Imutável depois de construída: os tokens são calculados uma única vez.
#[derive(Debug, Clone, PartialEq)]
pub struct EntradaReferencia {
    pub codigo: String,
    pub descricao: String,
    pub tokens: HashSet<String>,
}

impl EntradaReferencia {
    pub fn new(codigo: impl Into<String>, descricao: impl Into<String>) -> Self {
        let descricao = descricao.into();
        let tokens = tokenizar(&limpar_texto(&descricao));
        EntradaReferencia {
            codigo: codigo.into(),
            descricao,
            tokens,
        }
    }
}

impl From<RegistroServico> for EntradaReferencia {
    fn from(registro: RegistroServico) -> Self {
        EntradaReferencia::new(registro.codigo, registro.descricao)
    }
}

/// Resultado da busca: a entrada escolhida (se houver) e a pontuação de confiança.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sugestao<'a> {
    pub entrada: Option<&'a EntradaReferencia>,
    pub pontuacao: f64,
}

impl<'a> Sugestao<'a> {
    /// Nenhuma correspondência: código e descrição ausentes, pontuação 0.
    pub fn nenhuma() -> Self {
        Sugestao {
            entrada: None,
            pontuacao: 0.0,
        }
    }

    pub fn codigo(&self) -> Option<&'a str> {
        self.entrada.map(|e| e.codigo.as_str())
    }

    pub fn descricao(&self) -> Option<&'a str> {
        self.entrada.map(|e| e.descricao.as_str())
    }
}

/// Índice de Jaccard: `|A ∩ B| / |A ∪ B|`.
///
/// Dois conjuntos vazios têm similaridade 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    // Percorre o menor conjunto
    let (menor, maior) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersecao = menor.iter().filter(|t| maior.contains(*t)).count();
    let uniao = a.len() + b.len() - intersecao;

    if uniao == 0 {
        0.0
    } else {
        intersecao as f64 / uniao as f64
    }
}

/// Procura, em ordem de tabela, a entrada de referência mais parecida.
///
/// Regras:
/// - conjunto de palavras vazio: retorna `Sugestao::nenhuma()` sem percorrer a tabela;
/// - entradas sem palavras são ignoradas;
/// - comparação estrita (`>`): em caso de empate vence a PRIMEIRA entrada.
///
/// ### Exemplo
/// ```
/// use mapear_servicos_nbs::{EntradaReferencia, find_best_match, tokenizar};
///
/// let tabela = vec![
///     EntradaReferencia::new("X", "a c"),
///     EntradaReferencia::new("Y", "a b"),
/// ];
///
/// let sugestao = find_best_match(&tokenizar("a b"), &tabela);
/// assert_eq!(sugestao.codigo(), Some("Y"));
/// assert_eq!(sugestao.pontuacao, 1.0);
/// ```
pub fn find_best_match<'a>(
    tokens: &HashSet<String>,
    entradas: &'a [EntradaReferencia],
) -> Sugestao<'a> {
    if tokens.is_empty() {
        return Sugestao::nenhuma();
    }

    entradas
        .iter()
        .filter(|entrada| !entrada.tokens.is_empty())
        .fold(Sugestao::nenhuma(), |melhor, entrada| {
            let pontuacao = jaccard(tokens, &entrada.tokens);
            if pontuacao > melhor.pontuacao {
                Sugestao {
                    entrada: Some(entrada),
                    pontuacao,
                }
            } else {
                melhor
            }
        })
}

/// Tabela de referência carregada uma única vez e reutilizada por todas as
/// linhas de origem.
///
/// Além das entradas (na ordem original do arquivo), mantém um índice invertido
/// `palavra -> posições` para visitar apenas as entradas que compartilham ao
/// menos uma palavra com a descrição procurada.
#[derive(Debug, Default)]
pub struct TabelaReferencia {
    entradas: Vec<EntradaReferencia>,
    indice: HashMap<String, Vec<usize>>,
}

impl TabelaReferencia {
    pub fn new<I>(registros: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<EntradaReferencia>,
    {
        let entradas: Vec<EntradaReferencia> = registros.into_iter().map(Into::into).collect();

        // As posições são inseridas em ordem crescente
        let mut indice: HashMap<String, Vec<usize>> = HashMap::new();
        for (posicao, entrada) in entradas.iter().enumerate() {
            for token in &entrada.tokens {
                indice.entry(token.clone()).or_default().push(posicao);
            }
        }

        TabelaReferencia { entradas, indice }
    }

    pub fn len(&self) -> usize {
        self.entradas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entradas.is_empty()
    }

    /// Número de entradas cuja descrição não contém nenhuma palavra.
    pub fn entradas_vazias(&self) -> usize {
        self.entradas.iter().filter(|e| e.tokens.is_empty()).count()
    }

    pub fn numero_de_palavras(&self) -> usize {
        self.indice.len()
    }

    /// Mesmo resultado de [`find_best_match`] sobre [`Self::entradas`],
    /// visitando somente as candidatas do índice invertido.
    ///
    /// Entradas sem nenhuma palavra em comum teriam pontuação 0 e nunca
    /// superariam o valor inicial, por isso podem ser descartadas.
    pub fn melhor_correspondencia(&self, tokens: &HashSet<String>) -> Sugestao<'_> {
        if tokens.is_empty() {
            return Sugestao::nenhuma();
        }

        let mut candidatas: Vec<usize> = tokens
            .iter()
            .filter_map(|token| self.indice.get(token))
            .flatten()
            .copied()
            .collect();

        // Ordem de tabela preserva o desempate (primeira entrada vence)
        candidatas.sort_unstable();
        candidatas.dedup();

        candidatas
            .into_iter()
            .fold(Sugestao::nenhuma(), |melhor, posicao| {
                let entrada = &self.entradas[posicao];
                let pontuacao = jaccard(tokens, &entrada.tokens);
                if pontuacao > melhor.pontuacao {
                    Sugestao {
                        entrada: Some(entrada),
                        pontuacao,
                    }
                } else {
                    melhor
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrada(codigo: &str, tokens: &[&str]) -> EntradaReferencia {
        EntradaReferencia {
            codigo: codigo.to_string(),
            descricao: format!("descrição {codigo}"),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn conjunto(tokens: &[&str]) -> HashSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn jaccard_basico() {
        assert_eq!(jaccard(&conjunto(&["a", "b"]), &conjunto(&["a", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&conjunto(&["a", "b"]), &conjunto(&["b", "a"])), 1.0);
        assert_eq!(jaccard(&conjunto(&["a"]), &conjunto(&["b"])), 0.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn sem_palavras_nao_ha_correspondencia() {
        let tabela = vec![entrada("X", &["a"]), entrada("Y", &[])];
        assert_eq!(find_best_match(&HashSet::new(), &tabela), Sugestao::nenhuma());

        let indice = TabelaReferencia::new(tabela);
        assert_eq!(indice.melhor_correspondencia(&HashSet::new()), Sugestao::nenhuma());
    }

    #[test]
    fn tabela_so_com_entradas_vazias() {
        let tabela = vec![entrada("X", &[]), entrada("Y", &[])];
        let sugestao = find_best_match(&conjunto(&["a", "b"]), &tabela);
        assert_eq!(sugestao.codigo(), None);
        assert_eq!(sugestao.descricao(), None);
        assert_eq!(sugestao.pontuacao, 0.0);
    }

    #[test]
    fn escolhe_a_maior_pontuacao() {
        let tabela = vec![entrada("X", &["a", "c"]), entrada("Y", &["a", "b"])];
        let sugestao = find_best_match(&conjunto(&["a", "b"]), &tabela);
        assert_eq!(sugestao.codigo(), Some("Y"));
        assert_eq!(sugestao.descricao(), Some("descrição Y"));
        assert_eq!(sugestao.pontuacao, 1.0);
    }

    #[test]
    fn empate_primeira_entrada_vence() {
        let tabela = vec![
            entrada("X1", &["a", "b"]),
            entrada("F1", &["z"]),
            entrada("F2", &["y"]),
            entrada("F3", &["a", "b", "c"]),
            entrada("F4", &[]),
            entrada("X2", &["a", "b"]),
        ];
        let tokens = conjunto(&["a", "b"]);

        let linear = find_best_match(&tokens, &tabela);
        assert_eq!(linear.codigo(), Some("X1"));
        assert_eq!(linear.pontuacao, 1.0);

        let indice = TabelaReferencia::new(tabela.clone());
        assert_eq!(indice.melhor_correspondencia(&tokens).codigo(), Some("X1"));
    }

    #[test]
    fn sem_palavra_em_comum() {
        let tabela = vec![entrada("X", &["c", "d"])];
        let sugestao = find_best_match(&conjunto(&["a", "b"]), &tabela);
        assert_eq!(sugestao, Sugestao::nenhuma());
    }

    #[test]
    fn indice_invertido() {
        let tabela = TabelaReferencia::new(vec![
            EntradaReferencia::new("1.01", "Serviços de consultoria"),
            EntradaReferencia::new("1.02", "..."),
            EntradaReferencia::new("1.03", "Consultoria jurídica"),
        ]);

        assert_eq!(tabela.len(), 3);
        assert_eq!(tabela.entradas_vazias(), 1);
        assert_eq!(tabela.numero_de_palavras(), 4);

        let sugestao = tabela.melhor_correspondencia(&conjunto(&["consultoria", "jurídica"]));
        assert_eq!(sugestao.codigo(), Some("1.03"));
        assert_eq!(sugestao.pontuacao, 1.0);
    }
}
