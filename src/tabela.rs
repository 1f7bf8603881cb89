use calamine::{Reader, open_workbook_auto};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use crate::{NbsError, NbsResult, RE_EXTENSAO_PLANILHA, RE_TITULO_DE_SECAO, RE_URL, fmt_milhares};

/// Par (código, descrição) extraído de uma tabela.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistroServico {
    pub codigo: String,
    pub descricao: String,
}

impl RegistroServico {
    pub fn new(codigo: impl Into<String>, descricao: impl Into<String>) -> Self {
        RegistroServico {
            codigo: codigo.into(),
            descricao: descricao.into(),
        }
    }
}

/// Codificação de caracteres do arquivo CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Codificacao {
    /// ISO-8859-1, usada nos arquivos publicados pela prefeitura e pelo governo federal
    Latin1,
    Utf8,
    /// UTF-8 e, em caso de bytes inválidos, Latin-1
    Auto,
}

/// Parâmetros para localizar as colunas de código e descrição.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcoesLeitura {
    pub delimitador: u8,
    pub codificacao: Codificacao,
    /// Posição da linha de cabeçalho, contando apenas linhas não vazias (começa em 0)
    pub linha_cabecalho: usize,
    pub coluna_codigo: usize,
    pub coluna_descricao: usize,
}

impl OpcoesLeitura {
    /// Anexo da lista de serviços municipais (ex: Prefeitura de São Paulo).
    pub fn municipal() -> Self {
        OpcoesLeitura {
            delimitador: b';',
            codificacao: Codificacao::Latin1,
            linha_cabecalho: 7,
            coluna_codigo: 0,
            coluna_descricao: 2,
        }
    }

    /// Tabela NBS publicada pelo MDIC.
    pub fn nbs() -> Self {
        OpcoesLeitura {
            delimitador: b';',
            codificacao: Codificacao::Latin1,
            linha_cabecalho: 0,
            coluna_codigo: 0,
            coluna_descricao: 1,
        }
    }
}

/// Resultado da filtragem das linhas da tabela municipal.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Filtragem {
    pub registros: Vec<RegistroServico>,
    pub sem_descricao: usize,
    pub titulos_de_secao: usize,
}

/// Carrega os pares (código, descrição) de um arquivo CSV, de uma planilha
/// ou de uma URL `http(s)://`.
pub fn carregar_tabela(origem: &str, opcoes: &OpcoesLeitura) -> NbsResult<Vec<RegistroServico>> {
    let linhas = if RE_URL.is_match(origem) {
        let bytes = baixar_arquivo(origem)?;
        let texto = decodificar(bytes, opcoes.codificacao, origem)?;
        ler_linhas_csv(&texto, opcoes.delimitador)?
    } else if RE_EXTENSAO_PLANILHA.is_match(origem) {
        ler_linhas_planilha(Path::new(origem))?
    } else {
        let bytes = fs::read(origem).map_err(|e| NbsError::IoReader {
            source: e,
            arquivo: origem.into(),
        })?;
        let texto = decodificar(bytes, opcoes.codificacao, origem)?;
        ler_linhas_csv(&texto, opcoes.delimitador)?
    };

    let registros = extrair_registros(linhas, opcoes, origem)?;

    println!(
        "Encontrado {:>6} linhas de dados no arquivo <{}>.",
        fmt_milhares(registros.len()),
        origem
    );

    Ok(registros)
}

/// Converte os bytes do arquivo em texto.
///
/// Um BOM UTF-8 inicial identifica o arquivo como UTF-8 e é descartado,
/// independentemente da codificação escolhida.
pub fn decodificar(bytes: Vec<u8>, codificacao: Codificacao, arquivo: &str) -> NbsResult<String> {
    const BOM: &[u8] = b"\xEF\xBB\xBF";

    if let Some(resto) = bytes.strip_prefix(BOM) {
        return String::from_utf8(resto.to_vec()).map_err(|source| NbsError::Utf8 {
            source,
            arquivo: arquivo.to_string(),
        });
    }

    match codificacao {
        Codificacao::Latin1 => Ok(latin1(&bytes)),
        Codificacao::Utf8 => String::from_utf8(bytes).map_err(|source| NbsError::Utf8 {
            source,
            arquivo: arquivo.to_string(),
        }),
        Codificacao::Auto => match String::from_utf8(bytes) {
            Ok(texto) => Ok(texto),
            Err(erro) => {
                warn!("<{arquivo}> não é UTF-8 válido; lendo como Latin-1");
                Ok(latin1(erro.as_bytes()))
            }
        },
    }
}

// Cada byte ISO-8859-1 corresponde ao code point de mesmo valor
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Lê todas as linhas do texto CSV, aceitando linhas com número variável de colunas.
pub fn ler_linhas_csv(texto: &str, delimitador: u8) -> NbsResult<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimitador)
        .has_headers(false)
        .flexible(true)
        .from_reader(texto.as_bytes());

    let mut linhas = Vec::new();
    let mut record = csv::StringRecord::new();

    while rdr.read_record(&mut record)? {
        linhas.push(record.iter().map(String::from).collect());
    }

    Ok(linhas)
}

/// Lê a primeira aba de uma planilha (xlsx, xls, ods).
pub fn ler_linhas_planilha(path: &Path) -> NbsResult<Vec<Vec<String>>> {
    let mut planilha = open_workbook_auto(path)?;
    let arquivo = path.display().to_string();

    let range = planilha
        .worksheet_range_at(0)
        .ok_or_else(|| NbsError::PlanilhaSemAbas {
            arquivo: arquivo.clone(),
        })??;

    // O range começa na primeira célula preenchida: recompor as colunas à esquerda
    let coluna_inicial = range.start().map(|(_, col)| col as usize).unwrap_or_default();

    let linhas = range
        .rows()
        .map(|row| {
            std::iter::repeat_n(String::new(), coluna_inicial)
                .chain(row.iter().map(|celula| celula.to_string()))
                .collect()
        })
        .collect();

    debug!("Planilha <{arquivo}> lida a partir da coluna {coluna_inicial}");

    Ok(linhas)
}

// Linha física vazia (ou só com espaços): um único campo em branco.
// Linhas só com separadores (ex: `;;`) não estão vazias.
fn linha_vazia(linha: &[String]) -> bool {
    match linha {
        [] => true,
        [campo] => campo.trim().is_empty(),
        _ => false,
    }
}

/// Localiza o cabeçalho e extrai as colunas de código e descrição das linhas seguintes.
///
/// Apenas linhas vazias são ignoradas na contagem da linha de cabeçalho; linhas
/// compostas só de separadores (`;;`) contam como linhas. Células ausentes em
/// linhas curtas resultam em texto vazio.
pub fn extrair_registros(
    linhas: Vec<Vec<String>>,
    opcoes: &OpcoesLeitura,
    arquivo: &str,
) -> NbsResult<Vec<RegistroServico>> {
    let mut linhas: Vec<Vec<String>> = linhas
        .into_iter()
        .filter(|linha| !linha_vazia(linha))
        .collect();

    if linhas.len() <= opcoes.linha_cabecalho {
        return Err(NbsError::CabecalhoAusente {
            arquivo: arquivo.to_string(),
            linha: opcoes.linha_cabecalho,
            encontrado: linhas.len(),
        });
    }

    let dados = linhas.split_off(opcoes.linha_cabecalho + 1);
    let cabecalho = &linhas[opcoes.linha_cabecalho];

    for (nome, indice) in [
        ("código", opcoes.coluna_codigo),
        ("descrição", opcoes.coluna_descricao),
    ] {
        if indice >= cabecalho.len() {
            return Err(NbsError::ColunaAusente {
                arquivo: arquivo.to_string(),
                nome,
                indice,
                encontrado: cabecalho.len(),
            });
        }
    }

    info!(
        "Cabeçalho de <{arquivo}>: código = '{}', descrição = '{}'",
        cabecalho[opcoes.coluna_codigo], cabecalho[opcoes.coluna_descricao]
    );

    let registros = dados
        .into_iter()
        .map(|linha| {
            let celula = |indice: usize| linha.get(indice).cloned().unwrap_or_default();
            RegistroServico {
                codigo: celula(opcoes.coluna_codigo),
                descricao: celula(opcoes.coluna_descricao),
            }
        })
        .collect();

    Ok(registros)
}

/// Retém apenas as linhas que descrevem serviços.
///
/// Descarta descrições vazias e títulos de seção (ex: `1. Serviços de informática`).
/// Descrições só com espaços são mantidas: resultam em linha sem correspondência.
///
/// ### Exemplo
/// ```
/// use mapear_servicos_nbs::{RegistroServico, filtrar_registros_servico};
///
/// let filtragem = filtrar_registros_servico(vec![
///     RegistroServico::new("", "1. Serviços de informática e congêneres."),
///     RegistroServico::new("02658", "Análise e desenvolvimento de sistemas."),
///     RegistroServico::new("02659", ""),
///     RegistroServico::new("02660", "   "),
/// ]);
///
/// assert_eq!(filtragem.registros.len(), 2);
/// assert_eq!(filtragem.titulos_de_secao, 1);
/// assert_eq!(filtragem.sem_descricao, 1);
/// ```
pub fn filtrar_registros_servico(registros: Vec<RegistroServico>) -> Filtragem {
    registros
        .into_iter()
        .fold(Filtragem::default(), |mut acc, registro| {
            if registro.descricao.is_empty() {
                acc.sem_descricao += 1;
            } else if RE_TITULO_DE_SECAO.is_match(&registro.descricao) {
                acc.titulos_de_secao += 1;
            } else {
                acc.registros.push(registro);
            }
            acc
        })
}

/// Baixa o conteúdo de uma URL (ex: a tabela NBS no portal gov.br).
pub fn baixar_arquivo(url: &str) -> NbsResult<Vec<u8>> {
    let erro_download = |source| NbsError::Download {
        source,
        url: url.to_string(),
    };

    println!("Baixando <{url}>...");

    let cliente = reqwest::blocking::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(erro_download)?;

    let resposta = cliente.get(url).send().map_err(erro_download)?;

    if !resposta.status().is_success() {
        return Err(NbsError::DownloadStatus {
            status: resposta.status().as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = resposta.bytes().map_err(erro_download)?;
    debug!("{} bytes recebidos de <{url}>", bytes.len());

    Ok(bytes.to_vec())
}
