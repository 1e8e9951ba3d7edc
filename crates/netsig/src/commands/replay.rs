//! `netsig replay`: drive a registry from a script and collect every
//! dispatched update.

use std::fmt::Write as _;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use netsig_core::{
    AggregateState, BroadcastListener, ControllerRegistry, EthernetStatus, IndicatorUpdate,
    StaticStatusSource, TransportKind, UpdateStream, WifiStatus,
};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::error::CliError;
use crate::output;
use crate::script::{self, Script, Step};

/// Updates per step are bounded (an event plus a cross-transport
/// re-dispatch), and the stream is drained after every step.
const STREAM_CAPACITY: usize = 64;

/// Step number used for the initial status fetch.
const INITIAL_STEP: usize = 0;

#[derive(Debug, Serialize)]
struct ReplayRecord {
    step: usize,
    action: &'static str,
    transport: TransportKind,
    update: Arc<IndicatorUpdate>,
}

#[derive(Debug, Serialize)]
struct ReplayReport<'a> {
    updates: &'a [ReplayRecord],
    rejected: usize,
    aggregate: AggregateState,
    dump: String,
}

#[derive(Tabled)]
struct UpdateRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Visible")]
    visible: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl UpdateRow {
    fn from_record(r: &ReplayRecord, color: bool) -> Self {
        let icon = r.update.status_icon();
        Self {
            step: r.step,
            action: r.action,
            kind: r.update.label(),
            visible: output::flag(r.update.visible(), color),
            icon: icon.icon.to_string(),
            description: icon.content_description.clone(),
        }
    }
}

fn plain_line(r: &ReplayRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        r.step,
        r.update.label(),
        if r.update.visible() { "visible" } else { "hidden" },
        r.update.status_icon().icon
    )
}

fn drain(stream: &mut UpdateStream, step: usize, action: &'static str, out: &mut Vec<ReplayRecord>) {
    while let Some(Some(update)) = stream.next_update().now_or_never() {
        out.push(ReplayRecord {
            step,
            action,
            transport: update.transport(),
            update,
        });
    }
}

/// Everything a replay produced.
struct Replay {
    records: Vec<ReplayRecord>,
    rejected: usize,
    registry: ControllerRegistry,
}

fn run_script(script: Script, args: &ReplayArgs, ctx: &super::Context) -> Result<Replay, CliError> {
    let mut signal = ctx.config.to_signal_config()?;
    if args.no_mobile_data {
        signal.has_mobile_data = false;
    }
    if args.always_show_wifi {
        signal.show_wifi_indicator_when_enabled = true;
    }

    let registry = ControllerRegistry::new(signal)?;
    let wifi_source = Arc::new(StaticStatusSource::<WifiStatus>::empty());
    let ethernet_source = Arc::new(StaticStatusSource::<EthernetStatus>::empty());
    registry.add_wifi(wifi_source.clone())?;
    registry.add_ethernet(ethernet_source.clone())?;

    let listener = BroadcastListener::new(STREAM_CAPACITY);
    let mut stream = listener.subscribe();
    registry.register(Arc::new(listener));

    let mut records = Vec::new();

    // Ethernet first so wifi sees the settled default route.
    if let Some(status) = script.initial.ethernet {
        ethernet_source.set(status);
        registry.fetch_initial_state(TransportKind::Ethernet)?;
    }
    if let Some(status) = script.initial.wifi {
        wifi_source.set(status);
        registry.fetch_initial_state(TransportKind::Wifi)?;
    }
    drain(&mut stream, INITIAL_STEP, "initial", &mut records);

    let mut rejected = 0;
    for (idx, step) in script.steps.iter().enumerate() {
        let number = idx + 1;
        let result = match step {
            Step::Event { transport, event } => {
                registry.handle_status_event(*transport, event).map(|_| ())
            }
            Step::RadioOn { radio_on } => {
                registry.set_radio_on(*radio_on);
                Ok(())
            }
            Step::CarrierName { carrier_name } => {
                registry.set_carrier_network_name(carrier_name.sub_id, carrier_name.name.clone());
                Ok(())
            }
        };

        if let Err(source) = result {
            if args.strict {
                return Err(CliError::StepRejected {
                    step: number,
                    source,
                });
            }
            rejected += 1;
            if !ctx.quiet {
                eprintln!("step {number} ({}) rejected: {source}", step.label());
            }
        }
        drain(&mut stream, number, step.label(), &mut records);
    }

    debug!(updates = records.len(), rejected, "replay finished");
    Ok(Replay {
        records,
        rejected,
        registry,
    })
}

pub fn handle(args: &ReplayArgs, ctx: &super::Context) -> Result<(), CliError> {
    let script = script::load(&args.script)?;
    let Replay {
        records,
        rejected,
        registry,
    } = run_script(script, args, ctx)?;

    let structured = !matches!(ctx.format, OutputFormat::Table | OutputFormat::Plain);
    let rendered = if args.dump && structured {
        let report = ReplayReport {
            updates: &records,
            rejected,
            aggregate: registry.aggregate_snapshot(),
            dump: registry.dump(),
        };
        output::render_single(ctx.format, &report, |_| String::new(), |_| String::new())?
    } else {
        let color = ctx.color;
        let mut out = output::render_list(
            ctx.format,
            &records,
            |r| UpdateRow::from_record(r, color),
            plain_line,
        )?;
        if args.dump {
            let _ = write!(
                out,
                "\n\n{}aggregate={:?}",
                registry.dump(),
                registry.aggregate_snapshot()
            );
        }
        out
    };

    output::print_output(&rendered, ctx.quiet);
    registry.shutdown();
    Ok(())
}
