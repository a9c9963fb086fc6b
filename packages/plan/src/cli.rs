//! The `blockwire` command line.

use std::io::Write;
use std::path::PathBuf;

use blockwire_kernel::{ComposerRegistry, KernelDeployer};
use clap::Parser;

use crate::error::PlanError;
use crate::plan::DeploymentPlan;

/// Blockwire - deploy a block plan and resolve resources through it
#[derive(Parser, Debug)]
#[command(name = "blockwire")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Deployment plan (JSON)
    pub plan: PathBuf,

    /// Resolve NAME as seen by block instance INSTANCE (repeatable)
    #[arg(long, num_args = 2, value_names = ["INSTANCE", "NAME"])]
    pub resolve: Vec<String>,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Deploy the plan, print what was deployed and every requested
/// resolution, then shut the kernel down.
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), PlanError> {
    let plan = DeploymentPlan::from_path(&args.plan)?;
    let deployer = plan.deploy(ComposerRegistry::new())?;

    let reported = report(&deployer, args, out);
    let shut_down = deployer.shutdown().map_err(PlanError::from);
    reported.and(shut_down)
}

fn report(deployer: &KernelDeployer, args: &Args, out: &mut impl Write) -> Result<(), PlanError> {
    let mut deployed: Vec<_> = deployer
        .instances()
        .iter()
        .filter_map(|id| deployer.lookup(id))
        .collect();
    deployed.sort_by(|a, b| a.name().cmp(b.name()));

    for wirings in &deployed {
        let prefixes: Vec<&str> = wirings.prefixes().collect();
        writeln!(
            out,
            "deployed {} (block {}) wirings [{}]{}",
            wirings.name(),
            wirings.instance().block().id(),
            prefixes.join(" "),
            if wirings.provides_components() {
                " provides components"
            } else {
                ""
            }
        )
        .map_err(PlanError::Output)?;
    }

    for pair in args.resolve.chunks_exact(2) {
        let [instance, name] = pair else {
            continue;
        };
        let wirings = deployer
            .find(instance)
            .ok_or_else(|| PlanError::UnknownInstance {
                instance: instance.clone(),
                referenced_by: "--resolve".to_string(),
            })?;

        let written = match wirings.resolve(name)? {
            Some(resource) => {
                let contents = resource.read()?;
                writeln!(
                    out,
                    "{} {} -> {} ({} bytes)",
                    instance,
                    name,
                    resource,
                    contents.len()
                )
            }
            None => writeln!(out, "{} {} -> not found", instance, name),
        };
        written.map_err(PlanError::Output)?;
    }

    Ok(())
}

/// Render an error with its chain of causes, outermost first.
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        message.push_str(": ");
        message.push_str(&e.to_string());
        cause = e.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_resolve_pairs() {
        let args = Args::parse_from([
            "blockwire",
            "plan.json",
            "--resolve",
            "app",
            "auth:login.html",
            "--resolve",
            "auth",
            "secret",
            "-vv",
        ]);
        assert_eq!(args.plan, PathBuf::from("plan.json"));
        assert_eq!(args.resolve, vec!["app", "auth:login.html", "auth", "secret"]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.log_filter(), "trace");
    }

    #[test]
    fn resolve_needs_two_values() {
        let parsed = Args::try_parse_from(["blockwire", "plan.json", "--resolve", "app"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn describe_walks_causes_once() {
        let err = PlanError::Io {
            path: PathBuf::from("/nowhere/plan.json"),
            source: std::io::Error::other("no such file"),
        };
        assert_eq!(
            describe(&err),
            "cannot read plan /nowhere/plan.json: no such file"
        );
    }

    #[test]
    fn quiet_by_default() {
        let args = Args::parse_from(["blockwire", "plan.json"]);
        assert!(args.resolve.is_empty());
        assert_eq!(args.log_filter(), "warn");
    }
}
