//! `netsig resolve`: show which icon group a wifi standard maps to.

use std::fmt::Write as _;

use serde::Serialize;

use netsig_core::{CapabilityTier, IconGroup, Surface, policy};

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Resolution {
    standard: u8,
    tier: CapabilityTier,
    ready: bool,
    group: IconGroup,
    name: &'static str,
    sample_icon: String,
}

fn resolution(args: &ResolveArgs) -> Resolution {
    let tier = CapabilityTier::from_standard(args.standard);
    let group = policy::resolve(tier, args.ready);
    Resolution {
        standard: args.standard,
        tier,
        ready: args.ready,
        group,
        name: group.name(),
        sample_icon: group
            .signal_icon(Surface::StatusBar, 4, false)
            .to_string(),
    }
}

fn detail(r: &Resolution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Standard:    {}", r.standard);
    let _ = writeln!(out, "Tier:        {}", r.tier);
    let _ = writeln!(out, "Ready:       {}", r.ready);
    let _ = writeln!(out, "Group:       {} ({})", r.group, r.name);
    let _ = write!(out, "Sample icon: {}", r.sample_icon);
    out
}

pub fn handle(args: &ResolveArgs, ctx: &super::Context) -> Result<(), CliError> {
    let r = resolution(args);
    let rendered = output::render_single(ctx.format, &r, detail, |r| r.group.to_string())?;
    output::print_output(&rendered, ctx.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_wifi5_resolves_to_wifi6() {
        let r = resolution(&ResolveArgs {
            standard: 5,
            ready: true,
        });
        assert_eq!(r.group, IconGroup::Wifi6);
        assert_eq!(r.sample_icon, "ic_wifi_6_signal_4");
        assert!(detail(&r).contains("Wi-Fi 6 Icons"));
    }

    #[test]
    fn unknown_standard_is_baseline() {
        let r = resolution(&ResolveArgs {
            standard: 2,
            ready: false,
        });
        assert_eq!(r.tier, CapabilityTier::Baseline);
        assert_eq!(r.group, IconGroup::Default);
    }
}
