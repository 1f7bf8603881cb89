use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{Filtragem, RegistroServico, TabelaReferencia, limpar_texto, tokenizar};

/// Exibe a descrição, autoria e versão do programa.
pub fn imprimir_versao_do_programa() {
    let descr = [
        "Este programa sugere, para cada código de serviço municipal, o código NBS correspondente.",
        "NBS: Nomenclatura Brasileira de Serviços, tabela nacional publicada pelo MDIC.",
        "As descrições são convertidas em minúsculas, sem pontuação, e divididas em palavras.",
        "A pontuação de confiança (de 0 a 1) é o índice de Jaccard entre as palavras das duas descrições.",
        "Em caso de empate, prevalece o código NBS que aparece primeiro na tabela de referência.",
    ];

    for line in &descr {
        println!(" {}", line);
    }

    println!(
        "\n {}\n versão: {}\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
}

/// Linha da tabela de resultado: serviço municipal e código NBS sugerido.
#[derive(Debug, Clone, PartialEq)]
pub struct Correspondencia {
    pub codigo_servico: String,
    pub descricao_servico: String,
    pub codigo_nbs: Option<String>,
    pub descricao_nbs: Option<String>,
    pub pontuacao_confianca: f64,
}

/// Resolve um único registro contra a tabela de referência.
pub fn resolver_registro(registro: &RegistroServico, tabela: &TabelaReferencia) -> Correspondencia {
    let tokens = tokenizar(&limpar_texto(&registro.descricao));
    let sugestao = tabela.melhor_correspondencia(&tokens);

    Correspondencia {
        codigo_servico: registro.codigo.clone(),
        descricao_servico: registro.descricao.clone(),
        codigo_nbs: sugestao.codigo().map(String::from),
        descricao_nbs: sugestao.descricao().map(String::from),
        pontuacao_confianca: sugestao.pontuacao,
    }
}

/// Produz exatamente uma `Correspondencia` por registro, na ordem de entrada.
///
/// Com `paralelo`, as linhas são distribuídas entre as threads do Rayon;
/// o `collect` de um iterador indexado preserva a ordem, logo o resultado é
/// idêntico ao da execução sequencial.
pub fn mapear_servicos(
    registros: &[RegistroServico],
    tabela: &TabelaReferencia,
    paralelo: bool,
) -> Vec<Correspondencia> {
    debug!(
        "Mapeando {} registros contra {} entradas NBS (paralelo = {paralelo})",
        registros.len(),
        tabela.len()
    );

    if paralelo {
        registros
            .par_iter()
            .map(|registro| resolver_registro(registro, tabela))
            .collect()
    } else {
        registros
            .iter()
            .map(|registro| resolver_registro(registro, tabela))
            .collect()
    }
}

/// Faixas de confiança usadas no relatório.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FaixaConfianca {
    Nenhuma,
    Baixa,
    Moderada,
    Alta,
    MuitoAlta,
}

impl FaixaConfianca {
    pub fn classificar(pontuacao: f64) -> Self {
        match pontuacao {
            p if p <= 0.0 => FaixaConfianca::Nenhuma,
            p if p < 0.25 => FaixaConfianca::Baixa,
            p if p < 0.50 => FaixaConfianca::Moderada,
            p if p < 0.75 => FaixaConfianca::Alta,
            _ => FaixaConfianca::MuitoAlta,
        }
    }

    pub fn descricao(&self) -> &'static str {
        match self {
            FaixaConfianca::Nenhuma => "sem correspondência (0)",
            FaixaConfianca::Baixa => "baixa (0 a 0,25)",
            FaixaConfianca::Moderada => "moderada (0,25 a 0,50)",
            FaixaConfianca::Alta => "alta (0,50 a 0,75)",
            FaixaConfianca::MuitoAlta => "muito alta (0,75 a 1)",
        }
    }
}

/// Estatísticas da tabela de resultado.
#[derive(Debug, Clone, PartialEq)]
pub struct Resumo {
    pub total: usize,
    pub com_correspondencia: usize,
    pub sem_correspondencia: usize,
    pub confianca_media: f64,
    pub faixas: BTreeMap<FaixaConfianca, usize>,
    /// (limiar, número de linhas com pontuação abaixo do limiar)
    pub abaixo_do_limiar: Option<(f64, usize)>,
}

impl Resumo {
    pub fn new(resultado: &[Correspondencia], limiar: Option<f64>) -> Self {
        let total = resultado.len();
        let com_correspondencia = resultado.iter().filter(|c| c.codigo_nbs.is_some()).count();

        let soma: f64 = resultado.iter().map(|c| c.pontuacao_confianca).sum();
        let confianca_media = if total == 0 { 0.0 } else { soma / total as f64 };

        let faixas = resultado.iter().fold(BTreeMap::new(), |mut acc, c| {
            *acc.entry(FaixaConfianca::classificar(c.pontuacao_confianca))
                .or_insert(0) += 1;
            acc
        });

        let abaixo_do_limiar = limiar.map(|limiar| {
            let num = resultado
                .iter()
                .filter(|c| c.pontuacao_confianca < limiar)
                .count();
            (limiar, num)
        });

        Resumo {
            total,
            com_correspondencia,
            sem_correspondencia: total - com_correspondencia,
            confianca_media,
            faixas,
            abaixo_do_limiar,
        }
    }
}

pub fn imprimir_filtragem(filtragem: &Filtragem) {
    println!(
        " Linhas descartadas: {:>6} sem descrição e {:>6} títulos de seção.",
        fmt_milhares(filtragem.sem_descricao),
        fmt_milhares(filtragem.titulos_de_secao)
    );
    println!(
        " Serviços a mapear: {:>6}\n",
        fmt_milhares(filtragem.registros.len())
    );
}

pub fn imprimir_resumo(resumo: &Resumo) {
    println!(" --- Resultado do Mapeamento ---");
    println!(
        " Foram processados {} serviços: {} com código NBS sugerido e {} sem correspondência.",
        fmt_milhares(resumo.total),
        fmt_milhares(resumo.com_correspondencia),
        fmt_milhares(resumo.sem_correspondencia)
    );
    println!(
        " Pontuação de confiança média: {:.4}\n",
        resumo.confianca_media
    );

    let max_len = resumo
        .faixas
        .keys()
        .map(|faixa| faixa.descricao().chars().count())
        .max()
        .unwrap_or_default();

    let mut running_sum = 0;

    for (faixa, qtd) in &resumo.faixas {
        running_sum += qtd;
        println!(
            " Confiança {:<max_len$} = {:>9} ( soma acumulada = {:>9} )",
            faixa.descricao(),
            fmt_milhares(*qtd),
            fmt_milhares(running_sum)
        );
    }

    if let Some((limiar, num)) = resumo.abaixo_do_limiar {
        println!(
            "\n Serviços com confiança abaixo de {limiar}: {} (revisar manualmente)",
            fmt_milhares(num)
        );
    }

    println!();
}

/// Exibe todas as linhas da tabela de resultado.
pub fn imprimir_correspondencias(resultado: &[Correspondencia]) {
    let max = resultado
        .iter()
        .map(|c| c.codigo_servico.chars().count())
        .max()
        .unwrap_or_default();

    for c in resultado {
        println!(
            " {:<max$} -> {:<12} [{:.4}] {} => {}",
            c.codigo_servico,
            c.codigo_nbs.as_deref().unwrap_or("-"),
            c.pontuacao_confianca,
            c.descricao_servico,
            c.descricao_nbs.as_deref().unwrap_or("-")
        );
    }
    println!();
}

pub fn fmt_milhares(n: usize) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    for (i, c) in s.chars().enumerate() {
        // Ponto a cada três dígitos, contando a partir do fim
        if i > 0 && (len - i).is_multiple_of(3) {
            result.push('.');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntradaReferencia;

    fn tabela() -> TabelaReferencia {
        TabelaReferencia::new(vec![
            EntradaReferencia::new(
                "1.1502.10.00",
                "Serviços de consultoria em tecnologia da informação",
            ),
            EntradaReferencia::new("1.1401.11.00", "Serviços de limpeza de imóveis"),
        ])
    }

    #[test]
    fn uma_correspondencia_por_registro() {
        let registros = vec![
            RegistroServico::new("02800", "Limpeza de imóveis"),
            RegistroServico::new("02801", "???"),
            RegistroServico::new("02802", "Transporte aéreo"),
        ];

        let resultado = mapear_servicos(&registros, &tabela(), false);
        assert_eq!(resultado.len(), 3);

        assert_eq!(resultado[0].codigo_servico, "02800");
        assert_eq!(resultado[0].codigo_nbs.as_deref(), Some("1.1401.11.00"));
        // {limpeza, de, imóveis} vs {serviços, limpeza, de, imóveis}
        assert_eq!(resultado[0].pontuacao_confianca, 0.75);

        assert_eq!(resultado[1].codigo_nbs, None);
        assert_eq!(resultado[1].descricao_nbs, None);
        assert_eq!(resultado[1].pontuacao_confianca, 0.0);

        assert_eq!(resultado[2].codigo_nbs, None);
    }

    #[test]
    fn paralelo_igual_ao_sequencial() {
        let registros: Vec<RegistroServico> = (0..200)
            .map(|i| {
                let descricao = if i % 2 == 0 {
                    format!("consultoria em informação {i}")
                } else {
                    format!("limpeza {i}")
                };
                RegistroServico::new(format!("{i:05}"), descricao)
            })
            .collect();

        let tabela = tabela();
        assert_eq!(
            mapear_servicos(&registros, &tabela, true),
            mapear_servicos(&registros, &tabela, false)
        );
    }

    #[test]
    fn resumo_por_faixa() {
        let c = |pontuacao: f64| Correspondencia {
            codigo_servico: String::new(),
            descricao_servico: String::new(),
            codigo_nbs: (pontuacao > 0.0).then(|| "X".to_string()),
            descricao_nbs: None,
            pontuacao_confianca: pontuacao,
        };

        let resumo = Resumo::new(&[c(0.0), c(0.1), c(0.5), c(1.0)], Some(0.5));
        assert_eq!(resumo.total, 4);
        assert_eq!(resumo.com_correspondencia, 3);
        assert_eq!(resumo.sem_correspondencia, 1);
        assert!((resumo.confianca_media - 0.4).abs() < 1e-12);
        assert_eq!(resumo.faixas[&FaixaConfianca::Nenhuma], 1);
        assert_eq!(resumo.faixas[&FaixaConfianca::Baixa], 1);
        assert_eq!(resumo.faixas[&FaixaConfianca::Alta], 1);
        assert_eq!(resumo.faixas[&FaixaConfianca::MuitoAlta], 1);
        assert!(!resumo.faixas.contains_key(&FaixaConfianca::Moderada));
        assert_eq!(resumo.abaixo_do_limiar, Some((0.5, 2)));

        let vazio = Resumo::new(&[], None);
        assert_eq!(vazio.confianca_media, 0.0);
        assert_eq!(vazio.abaixo_do_limiar, None);
    }

    #[test]
    fn milhares() {
        assert_eq!(fmt_milhares(0), "0");
        assert_eq!(fmt_milhares(999), "999");
        assert_eq!(fmt_milhares(1000), "1.000");
        assert_eq!(fmt_milhares(1234567), "1.234.567");
    }
}
