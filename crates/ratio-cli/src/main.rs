//! `ratio`: print the throughput and machine counts a production plan needs.
//!
//! ```text
//! ratio [-d DIR] [-o FILE] [--json] [--no-trace] [--lane-capacity N] [ITEM[=RATE]...]
//! ```
//!
//! Demands given on the command line replace the dataset's plan.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use ratio_core::report::Report;
use ratio_core::resolver::{Demand, Resolution, ResolveError, Resolver};
use ratio_core::trace::Trace;
use ratio_data::{DataLoadError, load_dataset};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("invalid demand '{0}', expected ITEM or ITEM=RATE")]
    BadDemand(String),
    #[error("invalid lane capacity '{0}'")]
    BadLaneCapacity(String),
    #[error(transparent)]
    Data(#[from] DataLoadError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
struct Options {
    data_dir: PathBuf,
    output: Option<PathBuf>,
    json: bool,
    trace: bool,
    lane_capacity: Option<f64>,
    demands: Vec<Demand>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let opts = command_line();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Unable to parse options: {e}");
            return ExitCode::from(2);
        }
    };

    if matches.opt_present("h") {
        let brief = format!("Usage: {} [options] [ITEM[=RATE]...]", args[0]);
        eprintln!("{}", opts.usage(&brief));
        return ExitCode::SUCCESS;
    }

    let default_level = if matches.opt_present("v") { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = match options_from_matches(&matches) {
        Ok(o) => o,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Data(e)) => {
            for problem in e.problems() {
                log::error!("{problem}");
            }
            if matches!(e, DataLoadError::Invalid(_)) {
                log::error!("{e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn command_line() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.optopt("d", "data", "Dataset directory (default: bundled vanilla)", "DIR");
    opts.optopt("o", "output", "Write to FILE instead of stdout", "FILE");
    opts.optopt("", "lane-capacity", "Items per second one lane carries", "N");
    opts.optflag("", "json", "Emit the report as JSON");
    opts.optflag("", "no-trace", "Print only the totals");
    opts.optflag("v", "verbose", "Log every resolved root");
    opts.optflag("h", "help", "Show help");
    opts.parsing_style(getopts::ParsingStyle::FloatingFrees);
    opts
}

fn options_from_matches(matches: &getopts::Matches) -> Result<Options, Error> {
    let lane_capacity = match matches.opt_str("lane-capacity") {
        Some(s) => Some(parse_lane_capacity(&s)?),
        None => None,
    };
    let demands = matches
        .free
        .iter()
        .map(|arg| parse_demand(arg))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Options {
        data_dir: matches
            .opt_str("d")
            .map(PathBuf::from)
            .unwrap_or_else(ratio_data::vanilla_dir),
        output: matches.opt_str("o").map(PathBuf::from),
        json: matches.opt_present("json"),
        trace: !matches.opt_present("no-trace"),
        lane_capacity,
        demands,
    })
}

/// `ITEM=RATE`, or a bare `ITEM` for a demand with no minimum.
fn parse_demand(arg: &str) -> Result<Demand, Error> {
    match arg.split_once('=') {
        None if !arg.is_empty() => Ok(Demand::placeholder(arg)),
        Some((item, rate)) if !item.is_empty() => rate
            .trim()
            .parse::<f64>()
            .map(|rate| Demand::new(item, rate))
            .map_err(|_| Error::BadDemand(arg.to_string())),
        _ => Err(Error::BadDemand(arg.to_string())),
    }
}

fn parse_lane_capacity(arg: &str) -> Result<f64, Error> {
    match arg.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(Error::BadLaneCapacity(arg.to_string())),
    }
}

fn run(options: &Options) -> Result<(), Error> {
    let dataset = load_dataset(&options.data_dir)?;
    let demands = if options.demands.is_empty() {
        &dataset.plan.demands
    } else {
        &options.demands
    };
    if demands.is_empty() {
        log::warn!("nothing to resolve: no demands given and the plan has none");
    }
    let lane_capacity = options.lane_capacity.unwrap_or(dataset.plan.lane_capacity);

    let resolution = Resolver::new(&dataset.graph)
        .with_lane_capacity(lane_capacity)
        .resolve(demands)?;
    let report = Report::from_resolution(&dataset.graph, &resolution, lane_capacity);

    let rendered = if options.json {
        render_json(&resolution, &report, options.trace)?
    } else {
        render_text(&resolution, &report, options.trace)
    };

    match &options.output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            out.write_all(rendered.as_bytes())?;
            out.flush()?;
            log::info!("wrote {}", path.display());
        }
        None => io::stdout().lock().write_all(rendered.as_bytes())?,
    }
    Ok(())
}

/// The trace, one block per root, then the totals table.
fn render_text(resolution: &Resolution, report: &Report, trace: bool) -> String {
    let mut out = String::new();
    if trace {
        out.push_str(&resolution.trace.to_string());
    }
    out.push('\n');
    out.push_str(&report.to_string());
    out
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a Trace>,
}

fn render_json(resolution: &Resolution, report: &Report, trace: bool) -> Result<String, Error> {
    let output = JsonOutput {
        report,
        trace: trace.then_some(&resolution.trace),
    };
    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_core::test_utils::ore_plate_graph;

    fn matches(args: &[&str]) -> getopts::Matches {
        command_line().parse(args).unwrap()
    }

    #[test]
    fn demand_with_and_without_rate() {
        assert_eq!(parse_demand("plate=4").unwrap(), Demand::new("plate", 4.0));
        assert_eq!(
            parse_demand("iron-plate= 0.75").unwrap(),
            Demand::new("iron-plate", 0.75)
        );
        assert_eq!(parse_demand("stone").unwrap(), Demand::placeholder("stone"));
    }

    #[test]
    fn malformed_demands_are_rejected() {
        for arg in ["", "=4", "plate=", "plate=fast"] {
            assert!(
                matches!(parse_demand(arg), Err(Error::BadDemand(_))),
                "{arg:?} should be rejected"
            );
        }
    }

    #[test]
    fn lane_capacity_must_be_positive() {
        assert_eq!(parse_lane_capacity("15").unwrap(), 15.0);
        assert!(parse_lane_capacity("0").is_err());
        assert!(parse_lane_capacity("-1").is_err());
        assert!(parse_lane_capacity("wide").is_err());
    }

    #[test]
    fn options_default_to_vanilla_and_plan() {
        let options = options_from_matches(&matches(&[])).unwrap();
        assert_eq!(options.data_dir, ratio_data::vanilla_dir());
        assert!(options.trace);
        assert!(!options.json);
        assert!(options.demands.is_empty());
        assert_eq!(options.lane_capacity, None);
    }

    #[test]
    fn options_collect_flags_and_demands() {
        let options = options_from_matches(&matches(&[
            "plate=4",
            "--no-trace",
            "-d",
            "/tmp/data",
            "--lane-capacity",
            "15",
            "ore",
        ]))
        .unwrap();
        assert_eq!(options.data_dir, PathBuf::from("/tmp/data"));
        assert!(!options.trace);
        assert_eq!(options.lane_capacity, Some(15.0));
        assert_eq!(
            options.demands,
            vec![Demand::new("plate", 4.0), Demand::placeholder("ore")]
        );
    }

    #[test]
    fn text_output_has_trace_blocks_then_totals() {
        let graph = ore_plate_graph();
        let resolution = Resolver::new(&graph)
            .resolve(&[Demand::new("plate", 4.0)])
            .unwrap();
        let report = Report::from_resolution(&graph, &resolution, 7.5);

        let text = render_text(&resolution, &report, true);
        assert_eq!(
            text,
            "\n 4.00/s   4.0🏭 plate (smelter)\n   4.00/s ore\n\n## Totals\n   \
             4.0🏭    4.00/sec    0.5┋ plate (smelter)\n   0.0🏭    4.00/sec    0.5┋ ore (raw)\n"
        );

        let totals_only = render_text(&resolution, &report, false);
        assert!(totals_only.starts_with("\n## Totals\n"));
    }

    #[test]
    fn json_output_flattens_report() {
        let graph = ore_plate_graph();
        let resolution = Resolver::new(&graph)
            .resolve(&[Demand::new("plate", 4.0)])
            .unwrap();
        let report = Report::from_resolution(&graph, &resolution, 7.5);

        let value: serde_json::Value =
            serde_json::from_str(&render_json(&resolution, &report, false).unwrap()).unwrap();
        assert_eq!(value["lane_capacity"], 7.5);
        assert_eq!(value["rows"][0]["item"], "plate");
        assert_eq!(value["rows"][1]["building"], serde_json::Value::Null);
        assert!(value.get("trace").is_none());

        let value: serde_json::Value =
            serde_json::from_str(&render_json(&resolution, &report, true).unwrap()).unwrap();
        assert_eq!(value["trace"]["lines"].as_array().unwrap().len(), 2);
    }
}
