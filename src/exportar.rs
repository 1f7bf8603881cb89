use rust_xlsxwriter::{Format, Workbook};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::debug;

use crate::{
    ABA_RESULTADO, COLUNAS_RESULTADO, Codificacao, Correspondencia, LARGURA_COLUNAS, NbsError,
    NbsResult, RE_EXTENSAO_PLANILHA, decodificar, ler_linhas_csv, ler_linhas_planilha,
};

/// Formato do arquivo de resultado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatoSaida {
    /// Texto delimitado por ';' (UTF-8 com BOM)
    Csv,
    /// Planilha Excel
    Xlsx,
}

impl FormatoSaida {
    /// Deduz o formato pela extensão do arquivo; CSV por padrão.
    pub fn inferir(path: &Path) -> Self {
        if RE_EXTENSAO_PLANILHA.is_match(&path.display().to_string()) {
            FormatoSaida::Xlsx
        } else {
            FormatoSaida::Csv
        }
    }

    pub fn extensao(&self) -> &'static str {
        match self {
            FormatoSaida::Csv => "csv",
            FormatoSaida::Xlsx => "xlsx",
        }
    }
}

pub fn exportar_resultado(
    resultado: &[Correspondencia],
    path: &Path,
    formato: FormatoSaida,
) -> NbsResult<()> {
    match formato {
        FormatoSaida::Csv => exportar_csv(resultado, path)?,
        FormatoSaida::Xlsx => exportar_xlsx(resultado, path)?,
    }

    println!(
        " ---> Resultado gravado em <{}> ({} linhas)\n",
        path.display(),
        resultado.len()
    );

    Ok(())
}

/// Grava a tabela de resultado em CSV (separador ';', UTF-8 com BOM).
///
/// Código e descrição NBS ausentes resultam em células vazias.
pub fn exportar_csv(resultado: &[Correspondencia], path: &Path) -> NbsResult<()> {
    let mut buffer = BufWriter::new(File::create(path)?);

    // BOM: o Excel reconhece o arquivo como UTF-8
    buffer.write_all(b"\xEF\xBB\xBF")?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(buffer);

    wtr.write_record(COLUNAS_RESULTADO)?;

    for c in resultado {
        let pontuacao = c.pontuacao_confianca.to_string();
        wtr.write_record([
            c.codigo_servico.as_str(),
            c.descricao_servico.as_str(),
            c.codigo_nbs.as_deref().unwrap_or_default(),
            c.descricao_nbs.as_deref().unwrap_or_default(),
            pontuacao.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Grava a tabela de resultado em uma planilha com uma única aba.
pub fn exportar_xlsx(resultado: &[Correspondencia], path: &Path) -> NbsResult<()> {
    let mut workbook = Workbook::new();
    let negrito = Format::new().set_bold();
    let numero = Format::new().set_num_format("0.0000");

    let aba = workbook.add_worksheet();
    aba.set_name(ABA_RESULTADO)?;

    for (col, (nome, largura)) in COLUNAS_RESULTADO.iter().zip(LARGURA_COLUNAS).enumerate() {
        let col = col as u16;
        aba.write_string_with_format(0, col, *nome, &negrito)?;
        aba.set_column_width(col, largura)?;
    }

    for (i, c) in resultado.iter().enumerate() {
        let row = (i + 1) as u32;

        aba.write_string(row, 0, &c.codigo_servico)?;
        aba.write_string(row, 1, &c.descricao_servico)?;
        if let Some(codigo) = &c.codigo_nbs {
            aba.write_string(row, 2, codigo)?;
        }
        if let Some(descricao) = &c.descricao_nbs {
            aba.write_string(row, 3, descricao)?;
        }
        aba.write_number_with_format(row, 4, c.pontuacao_confianca, &numero)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Lê de volta um resultado exportado, em qualquer dos dois formatos.
pub fn ler_resultado(path: &Path) -> NbsResult<Vec<Correspondencia>> {
    let linhas = match FormatoSaida::inferir(path) {
        FormatoSaida::Xlsx => ler_linhas_planilha(path)?,
        FormatoSaida::Csv => {
            let bytes = fs::read(path).map_err(|e| NbsError::IoReader {
                source: e,
                arquivo: path.to_path_buf(),
            })?;
            let texto = decodificar(bytes, Codificacao::Utf8, &path.display().to_string())?;
            ler_linhas_csv(&texto, b';')?
        }
    };

    correspondencias_de_linhas(linhas, &path.display().to_string())
}

fn correspondencias_de_linhas(
    linhas: Vec<Vec<String>>,
    arquivo: &str,
) -> NbsResult<Vec<Correspondencia>> {
    let opcional = |valor: String| (!valor.is_empty()).then_some(valor);

    linhas
        .into_iter()
        .enumerate()
        .skip(1) // cabeçalho
        .map(|(idx, linha)| -> NbsResult<Correspondencia> {
            let mut campos = linha.into_iter();
            let mut proximo = || campos.next().unwrap_or_default();

            let codigo_servico = proximo();
            let descricao_servico = proximo();
            let codigo_nbs = opcional(proximo());
            let descricao_nbs = opcional(proximo());
            let valor = proximo();

            let pontuacao_confianca =
                valor
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| NbsError::PontuacaoInvalida {
                        arquivo: arquivo.to_string(),
                        linha: idx + 1,
                        valor: valor.clone(),
                    })?;

            Ok(Correspondencia {
                codigo_servico,
                descricao_servico,
                codigo_nbs,
                descricao_nbs,
                pontuacao_confianca,
            })
        })
        .collect::<NbsResult<Vec<_>>>()
        .inspect(|resultado| debug!("{} linhas lidas de <{arquivo}>", resultado.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formato_pela_extensao() {
        assert_eq!(FormatoSaida::inferir(Path::new("saida.XLSX")), FormatoSaida::Xlsx);
        assert_eq!(FormatoSaida::inferir(Path::new("saida.csv")), FormatoSaida::Csv);
        assert_eq!(FormatoSaida::inferir(Path::new("saida")), FormatoSaida::Csv);
    }

    #[test]
    fn pontuacao_invalida() {
        let linhas = vec![
            COLUNAS_RESULTADO.iter().map(|s| s.to_string()).collect(),
            vec!["1".into(), "a".into(), "".into(), "".into(), "abc".into()],
        ];
        let erro = correspondencias_de_linhas(linhas, "r.csv").unwrap_err();
        assert!(matches!(erro, NbsError::PontuacaoInvalida { linha: 2, .. }));
    }

    #[test]
    fn celulas_vazias_sao_ausentes() {
        let linhas = vec![
            COLUNAS_RESULTADO.iter().map(|s| s.to_string()).collect(),
            vec!["1".into(), "a".into(), "".into(), "".into(), "0".into()],
            vec!["2".into(), "b".into(), "X".into(), "d".into(), "0.5".into()],
        ];
        let resultado = correspondencias_de_linhas(linhas, "r.csv").unwrap();
        assert_eq!(resultado[0].codigo_nbs, None);
        assert_eq!(resultado[0].pontuacao_confianca, 0.0);
        assert_eq!(resultado[1].codigo_nbs.as_deref(), Some("X"));
        assert_eq!(resultado[1].pontuacao_confianca, 0.5);
    }
}
