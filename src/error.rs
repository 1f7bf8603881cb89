use std::{io, path::PathBuf, string::FromUtf8Error};
use thiserror::Error;

/// Tipo de retorno conveniente para todo o projeto
pub type NbsResult<T> = Result<T, NbsError>;

#[derive(Error, Debug)]
pub enum NbsError {
    #[error(
        "Linha de cabeçalho não encontrada!\n\
        Arquivo: {arquivo}\n\
        Linha do cabeçalho (começando do 0): {linha}\n\
        Linhas não vazias no arquivo: {encontrado}"
    )]
    CabecalhoAusente {
        arquivo: String,
        linha: usize,
        encontrado: usize,
    },

    #[error("Erro na leitura da planilha: {0}")]
    Calamine(#[from] calamine::Error),

    #[error(
        "Coluna inexistente!\n\
        Arquivo: {arquivo}\n\
        Coluna ({nome}): índice {indice}\n\
        O cabeçalho possui apenas {encontrado} colunas"
    )]
    ColunaAusente {
        arquivo: String,
        nome: &'static str,
        indice: usize,
        encontrado: usize,
    },

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro no processamento CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Falha ao baixar <{url}>: {source}")]
    Download {
        #[source]
        source: reqwest::Error,
        url: String,
    },

    #[error("Resposta HTTP {status} ao baixar <{url}>")]
    DownloadStatus { status: u16, url: String },

    #[error("Erro de I/O: {0}")]
    Io(#[from] io::Error),

    #[error(
        "Arquivo não encontrado ou ilegível!\n\
        Arquivo: {arquivo:?}\n\
        {source}"
    )]
    IoReader {
        #[source]
        source: io::Error,
        arquivo: PathBuf,
    },

    #[error("A planilha <{arquivo}> não contém nenhuma aba")]
    PlanilhaSemAbas { arquivo: String },

    #[error("Pontuação inválida na linha {linha} de <{arquivo}>: '{valor}'")]
    PontuacaoInvalida {
        arquivo: String,
        linha: usize,
        valor: String,
    },

    #[error("A tabela de referência <{arquivo}> não contém nenhuma linha de dados")]
    TabelaVazia { arquivo: String },

    #[error(
        "O arquivo <{arquivo}> não está codificado em UTF-8.\n\
        Tente --codificacao latin1 ou --codificacao auto.\n\
        {source}"
    )]
    Utf8 {
        #[source]
        source: FromUtf8Error,
        arquivo: String,
    },

    #[error("Erro ao gravar a planilha: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
