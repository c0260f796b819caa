use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use host_bridge::{channel_bridge, HostBridge, HttpBridge};
use rental_menu::{Key, MenuError, RentalMenuController, RequestOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;
mod simulated_host;

use commands::{ConsoleCommand, HELP};
use config::{load_settings, Settings, DEFAULT_CONFIG_PATH};
use simulated_host::{load_offer, SimulatedHost};

#[derive(Parser, Debug)]
#[command(about = "Drive the vehicle rental menu from a terminal")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Base URL actions are POSTed to.
    #[arg(long)]
    host_url: Option<String>,
    /// WebSocket URL the host pushes events on.
    #[arg(long)]
    events_url: Option<String>,
    /// Run against an in-process host that acknowledges everything.
    #[arg(long)]
    simulate: bool,
    /// Offer JSON pushed by `open` in simulated mode.
    #[arg(long)]
    offer: Option<PathBuf>,
}

fn apply_args(settings: &mut Settings, args: Args) {
    if let Some(host_url) = args.host_url {
        settings.host_url = host_url;
    }
    if let Some(events_url) = args.events_url {
        settings.events_url = Some(events_url);
    }
    if args.simulate {
        settings.simulate = true;
    }
    if let Some(offer) = args.offer {
        settings.offer_path = Some(offer);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    apply_args(&mut settings, args);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut simulated = None;
    let mut http = None;
    let bridge: Arc<dyn HostBridge> = if settings.simulate {
        let offer = load_offer(settings.offer_path.as_deref())?;
        let (bridge, endpoint) = channel_bridge();
        simulated = Some(SimulatedHost::spawn(
            endpoint,
            offer,
            Duration::from_millis(settings.simulated_reply_ms),
        ));
        info!("running against simulated host");
        Arc::new(bridge)
    } else {
        let bridge = Arc::new(
            HttpBridge::new(&settings.host_url).context("failed to set up host bridge")?,
        );
        info!(host_url = %settings.host_url, "using http host bridge");
        http = Some(Arc::clone(&bridge));
        bridge
    };

    // Subscribe before any event source starts.
    let controller = RentalMenuController::attach(bridge, settings.controller_settings());
    controller.add_observer(Arc::new(|view| println!("{}", render::status_line(view))));

    if let Some(http) = http {
        match settings.events_url.clone() {
            Some(events_url) => {
                tokio::spawn(async move {
                    if let Err(err) = http.run_event_stream(&events_url).await {
                        error!(%err, %events_url, "host event stream ended");
                    }
                });
            }
            None => warn!("no events url configured; the menu cannot be opened"),
        }
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(command) => command,
            Err(commands::ConsoleCommandError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Show => println!("{}", render::render_menu(&controller.view())),
            ConsoleCommand::Open => match &simulated {
                Some(host) => {
                    if host.open_menu() == 0 {
                        warn!("offer pushed but nobody is subscribed");
                    }
                }
                None => println!("the menu is opened by the host"),
            },
            ConsoleCommand::Category(name) => {
                if !controller.select_category(&name) {
                    println!("no category named '{name}'");
                }
            }
            ConsoleCommand::Search(text) => controller.set_search_query(text),
            ConsoleCommand::Vehicle(id) => {
                if let Err(err) = controller.select_vehicle_by_id(&id) {
                    println!("{err}");
                }
            }
            ConsoleCommand::Color(value) => match controller.select_color_by_value(&value) {
                Ok(true) => {}
                Ok(false) => println!("select a vehicle first"),
                Err(err) => println!("{err}"),
            },
            ConsoleCommand::Pay(method) => controller.set_payment_method(method),
            ConsoleCommand::Rent => spawn_action(&controller, "rent", |c| async move {
                c.request_rent().await
            }),
            ConsoleCommand::Return => spawn_action(&controller, "return", |c| async move {
                c.request_return().await
            }),
            ConsoleCommand::Close => spawn_action(&controller, "close", |c| async move {
                c.request_close().await
            }),
            ConsoleCommand::Escape => spawn_action(&controller, "close", |c| async move {
                c.handle_key(Key::Escape).await
            }),
        }
    }

    controller.detach();
    drop(simulated);
    info!("rental console exiting");
    Ok(())
}

fn outcome_message(label: &str, err: &MenuError) -> String {
    if err.is_validation() {
        format!("{label}: not sent, {err}")
    } else {
        format!("{label}: host request failed, {err}")
    }
}

/// Host requests run off the input loop so the menu stays responsive while
/// one is outstanding.
fn spawn_action<F, Fut>(controller: &Arc<RentalMenuController>, label: &'static str, action: F)
where
    F: FnOnce(Arc<RentalMenuController>) -> Fut,
    Fut: Future<Output = RequestOutcome> + Send + 'static,
{
    let pending = action(Arc::clone(controller));
    tokio::spawn(async move {
        match pending.await {
            RequestOutcome::Completed => println!("{label}: done"),
            RequestOutcome::Superseded => println!("{label}: acknowledged, menu was refreshed"),
            RequestOutcome::Ignored => println!("{label}: ignored (menu closed or busy)"),
            RequestOutcome::Rejected(err) | RequestOutcome::Failed(err) => {
                println!("{}", outcome_message(label, &err));
            }
        }
    });
}
