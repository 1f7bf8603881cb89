use clap::Parser;
use rand::Rng;
use std::path::PathBuf;

use crate::{
    ARQUIVO_SAIDA, Codificacao, FormatoSaida, NbsError, NbsResult, OpcoesLeitura, URL_NBS,
};

// Estrutura para o Clap processar os argumentos da linha de comando
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    /// Arquivo com os códigos de serviço municipais (CSV ou planilha).
    ///
    /// Ex: anexo da lista de serviços da Prefeitura de São Paulo.
    #[arg(short, long, required = true)]
    servicos: Option<String>,

    /// Tabela NBS de referência: arquivo local ou URL http(s).
    #[arg(short, long, default_value = URL_NBS)]
    referencia: String,

    /// Arquivo de resultado.
    ///
    /// Padrão: `ZZZ-<número aleatório>-mapeamento_servicos_para_nbs.csv`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Formato do resultado (padrão: deduzido da extensão do arquivo de resultado)
    #[arg(short, long, value_enum)]
    formato: Option<FormatoSaida>,

    /// Separador de colunas do arquivo de serviços (';', ',', '|', tab)
    #[arg(long, default_value = ";", value_parser = parse_delimitador)]
    delimitador: u8,

    /// Codificação do arquivo de serviços
    #[arg(long, value_enum, default_value_t = Codificacao::Latin1)]
    codificacao: Codificacao,

    /// Linha do cabeçalho no arquivo de serviços (começando do 0, sem contar linhas vazias)
    #[arg(long, default_value_t = 7)]
    linha_cabecalho: usize,

    /// Coluna do código de serviço (começando do 0)
    #[arg(long, default_value_t = 0)]
    coluna_codigo: usize,

    /// Coluna da descrição do serviço (começando do 0)
    #[arg(long, default_value_t = 2)]
    coluna_descricao: usize,

    /// Separador de colunas da tabela NBS
    #[arg(long, default_value = ";", value_parser = parse_delimitador)]
    ref_delimitador: u8,

    /// Codificação da tabela NBS
    #[arg(long, value_enum, default_value_t = Codificacao::Latin1)]
    ref_codificacao: Codificacao,

    /// Linha do cabeçalho na tabela NBS
    #[arg(long, default_value_t = 0)]
    ref_linha_cabecalho: usize,

    /// Coluna do código NBS
    #[arg(long, default_value_t = 0)]
    ref_coluna_codigo: usize,

    /// Coluna da descrição NBS
    #[arg(long, default_value_t = 1)]
    ref_coluna_descricao: usize,

    /// Distribuir a comparação das linhas entre várias threads
    #[arg(short, long, default_value_t = false)]
    paralelo: bool,

    /// Exibir todas as linhas do resultado
    #[arg(short, long, default_value_t = false)]
    exibir: bool,

    /// Contar serviços com pontuação de confiança abaixo deste valor (entre 0 e 1)
    #[arg(short, long)]
    limiar: Option<f64>,

    /// Ativar modo detalhado (verbose)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug)]
pub struct Config {
    pub servicos: String,
    pub referencia: String,
    pub opcoes_servicos: OpcoesLeitura,
    pub opcoes_referencia: OpcoesLeitura,
    pub output: PathBuf,
    pub formato: FormatoSaida,
    pub paralelo: bool,
    pub exibir: bool,
    pub limiar: Option<f64>,
    pub verbose: bool,
}

pub fn get_config() -> NbsResult<Config> {
    configurar(Arguments::parse())
}

fn configurar(args: Arguments) -> NbsResult<Config> {
    let servicos = args
        .servicos
        .ok_or_else(|| NbsError::Config("Arquivo de serviços municipais não definido".into()))?;

    if let Some(limiar) = args.limiar.filter(|l| !(0.0..=1.0).contains(l)) {
        return Err(NbsError::Config(format!(
            "Limiar deve estar entre 0 e 1, encontrado {limiar}"
        )));
    }

    // Formato explícito > extensão do arquivo > CSV
    let formato = args
        .formato
        .or_else(|| args.output.as_deref().map(FormatoSaida::inferir))
        .unwrap_or(FormatoSaida::Csv);

    let output = args.output.unwrap_or_else(|| {
        let mut rng = rand::rng();
        PathBuf::from(format!(
            "ZZZ-{:06}-{}.{}",
            rng.random_range(0..999999),
            ARQUIVO_SAIDA,
            formato.extensao()
        ))
    });

    Ok(Config {
        servicos,
        referencia: args.referencia,
        opcoes_servicos: OpcoesLeitura {
            delimitador: args.delimitador,
            codificacao: args.codificacao,
            linha_cabecalho: args.linha_cabecalho,
            coluna_codigo: args.coluna_codigo,
            coluna_descricao: args.coluna_descricao,
        },
        opcoes_referencia: OpcoesLeitura {
            delimitador: args.ref_delimitador,
            codificacao: args.ref_codificacao,
            linha_cabecalho: args.ref_linha_cabecalho,
            coluna_codigo: args.ref_coluna_codigo,
            coluna_descricao: args.ref_coluna_descricao,
        },
        output,
        formato,
        paralelo: args.paralelo,
        exibir: args.exibir,
        limiar: args.limiar,
        verbose: args.verbose,
    })
}

/// Aceita um único caractere ASCII, ou `tab` / `\t`.
fn parse_delimitador(valor: &str) -> Result<u8, String> {
    match valor {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = valor.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!(
                    "separador inválido: '{valor}' (use um único caractere ASCII)"
                )),
            }
        }
    }
}
