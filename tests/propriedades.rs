use mapear_servicos_nbs::{
    EntradaReferencia, TabelaReferencia, find_best_match, limpar_texto, tokenizar,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn caractere_preservado(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || c.is_whitespace()
        || ('\x1c'..='\x1f').contains(&c)
        || ('\u{e0}'..='\u{fa}').contains(&c)
}

fn tabela_de(descricoes: &[Vec<String>]) -> Vec<EntradaReferencia> {
    descricoes
        .iter()
        .enumerate()
        .map(|(i, palavras)| EntradaReferencia::new(format!("{i:03}"), palavras.join(" ")))
        .collect()
}

// ── Normalização ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalizacao_so_contem_caracteres_permitidos(texto in any::<String>()) {
        let limpo = limpar_texto(&texto);
        prop_assert!(
            limpo.chars().all(caractere_preservado),
            "caractere inesperado em {:?}",
            limpo
        );
    }

    #[test]
    fn normalizacao_idempotente(texto in any::<String>()) {
        let uma_vez = limpar_texto(&texto);
        prop_assert_eq!(limpar_texto(&uma_vez), uma_vez);
    }

    #[test]
    fn normalizacao_de_texto_portugues(texto in "[A-Za-zÀ-Úà-ú0-9 ,.;:()/-]{0,60}") {
        let limpo = limpar_texto(&texto);
        prop_assert!(limpo.chars().all(caractere_preservado));
        prop_assert!(!limpo.contains(|c: char| c.is_ascii_punctuation()));
    }
}

// ── Busca da melhor correspondência ────────────────────────────────────────

proptest! {
    #[test]
    fn sem_palavras_nunca_ha_correspondencia(
        descricoes in prop::collection::vec(prop::collection::vec("[a-e]", 0..4), 0..20)
    ) {
        let tabela = tabela_de(&descricoes);
        let sugestao = find_best_match(&HashSet::new(), &tabela);
        prop_assert_eq!(sugestao.codigo(), None);
        prop_assert_eq!(sugestao.descricao(), None);
        prop_assert_eq!(sugestao.pontuacao, 0.0);
    }

    #[test]
    fn indice_invertido_equivale_a_busca_linear(
        descricoes in prop::collection::vec(prop::collection::vec("[a-f]", 0..5), 0..30),
        palavras in prop::collection::vec("[a-f]", 0..5),
    ) {
        let entradas = tabela_de(&descricoes);
        let tokens = tokenizar(&palavras.join(" "));

        let linear = find_best_match(&tokens, &entradas);
        let tabela = TabelaReferencia::new(entradas.clone());
        let indexada = tabela.melhor_correspondencia(&tokens);

        prop_assert_eq!(linear.codigo(), indexada.codigo());
        prop_assert_eq!(linear.pontuacao.to_bits(), indexada.pontuacao.to_bits());
    }

    #[test]
    fn pontuacao_entre_zero_e_um(
        descricoes in prop::collection::vec(prop::collection::vec("[a-f]", 0..5), 0..30),
        palavras in prop::collection::vec("[a-f]", 0..5),
    ) {
        let entradas = tabela_de(&descricoes);
        let sugestao = find_best_match(&tokenizar(&palavras.join(" ")), &entradas);

        match sugestao.entrada {
            Some(entrada) => {
                prop_assert!(sugestao.pontuacao > 0.0 && sugestao.pontuacao <= 1.0);
                prop_assert!(!entrada.tokens.is_empty());
            }
            None => prop_assert_eq!(sugestao.pontuacao, 0.0),
        }
    }

    #[test]
    fn primeira_entrada_com_pontuacao_maxima_vence(
        descricoes in prop::collection::vec(prop::collection::vec("[a-c]", 1..3), 1..15),
        palavras in prop::collection::vec("[a-c]", 1..3),
    ) {
        let entradas = tabela_de(&descricoes);
        let tokens = tokenizar(&palavras.join(" "));
        let sugestao = find_best_match(&tokens, &entradas);

        if let Some(escolhida) = sugestao.entrada {
            let posicao: usize = escolhida.codigo.parse().unwrap();
            for anterior in &entradas[..posicao] {
                let a = &tokens;
                let b = &anterior.tokens;
                let inter = a.intersection(b).count() as f64;
                let uniao = a.union(b).count() as f64;
                prop_assert!(inter / uniao < sugestao.pontuacao);
            }
        }
    }
}
