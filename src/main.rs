use execution_time::ExecutionTime;
use std::process;
use tracing::{Level, info};

use mapear_servicos_nbs::{
    NbsError, NbsResult, Resumo, TabelaReferencia, carregar_tabela, exportar_resultado,
    filtrar_registros_servico, get_config, imprimir_correspondencias, imprimir_filtragem,
    imprimir_resumo, imprimir_versao_do_programa, mapear_servicos,
};

fn main() {
    // A forma mais idiomática de reportar erros ao usuário final sem stack trace técnico
    if let Err(err) = run() {
        eprintln!("\n[ERRO CRÍTICO]: {err}");
        process::exit(1);
    }
}

fn iniciar_log(verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> NbsResult<()> {
    let timer = ExecutionTime::start();

    // 1. Obter Configurações
    let config = get_config()?;
    iniciar_log(config.verbose);

    imprimir_versao_do_programa();

    if config.verbose {
        println!("{:#?}\n", config);
    }

    // 2. Tabela municipal: apenas linhas que descrevem serviços
    let registros = carregar_tabela(&config.servicos, &config.opcoes_servicos)?;
    let filtragem = filtrar_registros_servico(registros);
    imprimir_filtragem(&filtragem);

    // 3. Tabela NBS: palavras e índice invertido calculados uma única vez
    let referencia = carregar_tabela(&config.referencia, &config.opcoes_referencia)?;
    if referencia.is_empty() {
        return Err(NbsError::TabelaVazia {
            arquivo: config.referencia.clone(),
        });
    }

    let tabela = TabelaReferencia::new(referencia);
    info!(
        "Tabela NBS: {} entradas, {} sem descrição, {} palavras distintas",
        tabela.len(),
        tabela.entradas_vazias(),
        tabela.numero_de_palavras()
    );

    // 4. Mapeamento
    let resultado = mapear_servicos(&filtragem.registros, &tabela, config.paralelo);

    // 5. Relatório
    imprimir_resumo(&Resumo::new(&resultado, config.limiar));

    if config.exibir {
        imprimir_correspondencias(&resultado);
    }

    // 6. Exportação
    exportar_resultado(&resultado, &config.output, config.formato)?;

    println!(" Mapeamento concluído com sucesso.\n");
    timer.print_elapsed_time();

    Ok(())
}
