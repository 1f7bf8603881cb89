// --- Tabelas e constantes de referência ---

/// Tabela NBS 2.0 publicada pelo MDIC (separador ';', codificação Latin-1).
pub const URL_NBS: &str =
    "https://www.gov.br/mdic/pt-br/images/REPOSITORIO/scs/decos/NBS/NBSa_2-0.csv";

/// Nome base do arquivo de resultado.
pub const ARQUIVO_SAIDA: &str = "mapeamento_servicos_para_nbs";

/// Nome da aba na exportação em planilha.
pub const ABA_RESULTADO: &str = "Mapeamento NBS";

/// Colunas da tabela de resultado, na ordem de exportação.
pub const COLUNAS_RESULTADO: [&str; 5] = [
    "codigo_servico_municipal",
    "descricao_servico_municipal",
    "codigo_nbs_sugerido",
    "descricao_nbs_sugerida",
    "pontuacao_confianca",
];

/// Largura sugerida (em caracteres) de cada coluna na planilha exportada.
pub const LARGURA_COLUNAS: [f64; 5] = [16.0, 70.0, 16.0, 70.0, 12.0];
