use alert_console::{AlertEngine, Cli, ConsoleSink, EngineCommand, WsConnector, parse_command};

use {
    anyhow::Context,
    clap::Parser,
    std::{io::BufRead, panic, thread},
};

fn init_log() {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Warn)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("alert_console"), my_code_level)
        .parse_default_env()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    init_log();

    let args = Cli::parse();
    let lexicon = args.load_lexicon().context("Failed to load keyword lexicon")?;
    let endpoints = args.endpoints();
    log::info!(
        "Alert console v{} -> {} / {}",
        env!("CARGO_PKG_VERSION"),
        endpoints.alert_url(),
        endpoints.video_url()
    );

    let mut engine = AlertEngine::new(endpoints, &lexicon, Box::new(WsConnector::new()), ConsoleSink::new());
    let (commands_tx, commands_rx) = alert_console::engine::command_channel();

    for command in args.startup_commands() {
        commands_tx
            .send(command)
            .with_context(|| format!("Failed to queue start-up command {:?}", command))?;
    }

    // Ctrl-C
    let ctrl_c_tx = commands_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && ctrl_c_tx.send(EngineCommand::Shutdown).is_err() {
            log::warn!("Ctrl-C received after the engine stopped");
        }
    });

    // Operator commands on stdin: connect / disconnect / reconnect / show N / quit.
    // Blocking reads, so a plain thread rather than a runtime task.
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if commands_tx.send(command).is_err() {
                        break;
                    }
                }
                None => log::warn!("Unknown command '{}'", line.trim()),
            }
        }
    });

    engine.run(commands_rx).await;

    let aggregator = engine.aggregator();
    log::info!(
        "Shut down. {} alerts this run ({} today), {} frames shown",
        aggregator.total_count(),
        aggregator.today_count(),
        engine.sink().frames_shown()
    );
    Ok(())
}
