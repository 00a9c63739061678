use fileswarm::servers::signals::Halted;
use fileswarm::{app, bootstrap};

#[tokio::main]
async fn main() {
    let (config, app_container) = bootstrap::app::setup();

    let (jobs, halt_senders) = app::start(&config, &app_container).await;

    // handle the signals
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Fileswarm tracker shutting down ...");

            for halt in halt_senders {
                let _ = halt.send(Halted::Normal);
            }

            // Await for all jobs to shutdown
            futures::future::join_all(jobs).await;
            tracing::info!("Fileswarm tracker successfully shutdown.");
        }
    }
}
