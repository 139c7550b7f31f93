// crates/kdt_cli/src/main.rs
//
// Offline CLI entrypoint for the Konditional engine: decode a snapshot,
// evaluate/diff/validate it, and (optionally) render the result.
// Strictly offline & deterministic: no network, no OS RNG.

mod args;

use args::{Cli, CliError, Command, DiffArgs, EvalArgs, ValidateArgs};
use clap::Parser;
use kdt_core::axis::AxisValue;
use kdt_core::config::FeatureValue;
use kdt_core::context::Context;
use kdt_io::schema::{FeatureSchema, FeatureSchemaBuilder, FeatureType};
use kdt_io::wire::SnapshotLoadOptions;
use kdt_registry::{Registry, RegistryConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("kdt: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::Eval(a) => run_eval(a),
        Command::Diff(a) => run_diff(a),
        Command::Validate(a) => run_validate(a),
    }
}

/// Parse a flat `{ "feature_id": "type_name" }` schema file (the
/// declared-schema discipline, written by hand here since `kdt_io` only
/// exposes the builder, not a JSON loader — this CLI-only convenience
/// doesn't belong in the parse-boundary crate).
fn load_schema(raw: &str) -> Result<FeatureSchema, CliError> {
    let map: std::collections::BTreeMap<String, String> =
        serde_json::from_str(raw).map_err(|e| CliError::BadSchema(e.to_string()))?;

    let mut builder = FeatureSchemaBuilder::new();
    for (feature_id, type_name) in map {
        let ty = match type_name.as_str() {
            "bool" => FeatureType::Bool,
            "string" => FeatureType::Str,
            "int" => FeatureType::Int,
            "double" => FeatureType::Double,
            "enum" => FeatureType::Enum,
            "object" => FeatureType::Object,
            other => return Err(CliError::BadSchema(format!("{feature_id}: unknown type {other}"))),
        };
        builder = builder.declare(feature_id, ty);
    }
    Ok(builder.build())
}

fn load_options(skip_unknown_keys: bool) -> SnapshotLoadOptions {
    SnapshotLoadOptions { skip_unknown_keys }
}

/// Assemble a `Context` from the flat `--stable-id`/`--locale`/`--platform`/
/// `--app-version`/`--axis` flags `EvalArgs` carries.
fn build_context(args: &EvalArgs) -> Result<Context, CliError> {
    let mut ctx = Context::new();

    if let Some(raw) = &args.stable_id {
        let id = kdt_core::ids::StableId::of_opaque(raw)
            .map_err(|e| CliError::BadContext(format!("--stable-id {raw}: {e}")))?;
        ctx = ctx.with_stable_id(id);
    }
    if let Some(raw) = &args.locale {
        let locale: kdt_core::locale::AppLocale =
            raw.parse().map_err(|_| CliError::BadContext(format!("--locale {raw}")))?;
        ctx = ctx.with_locale(locale);
    }
    if let Some(raw) = &args.platform {
        let platform: kdt_core::platform::Platform =
            raw.parse().map_err(|_| CliError::BadContext(format!("--platform {raw}")))?;
        ctx = ctx.with_platform(platform);
    }
    if let Some(raw) = &args.app_version {
        let version: kdt_core::version::Version =
            raw.parse().map_err(|_| CliError::BadContext(format!("--app-version {raw}")))?;
        ctx = ctx.with_app_version(version);
    }
    for raw in &args.axes {
        let (axis_id, value) = args::parse_axis(raw)?;
        let axis = AxisValue::new(&axis_id, value).map_err(|e| CliError::BadContext(format!("--axis {raw}: {e}")))?;
        ctx = ctx.with_axis(axis);
    }

    Ok(ctx)
}

/// Build a `FeatureValue` of the declared type from a JSON literal, used for
/// `--fallback` when the schema has a type on record for `--feature`.
fn value_from_typed(ty: FeatureType, v: &serde_json::Value) -> Result<FeatureValue, CliError> {
    let bad = || CliError::BadFallback(format!("expected {}, got {v}", ty.as_str()));
    match ty {
        FeatureType::Bool => v.as_bool().map(FeatureValue::Bool).ok_or_else(bad),
        FeatureType::Str => v.as_str().map(|s| FeatureValue::Str(s.to_string())).ok_or_else(bad),
        FeatureType::Int => v.as_i64().map(FeatureValue::Int).ok_or_else(bad),
        FeatureType::Double => v.as_f64().map(FeatureValue::Double).ok_or_else(bad),
        FeatureType::Enum => v.as_str().map(|s| FeatureValue::Enum(s.to_string())).ok_or_else(bad),
        FeatureType::Object => {
            if v.is_object() {
                Ok(FeatureValue::Object(v.clone()))
            } else {
                Err(bad())
            }
        }
    }
}

/// Infer a `FeatureValue` from a JSON literal when `--feature` isn't
/// declared in the schema at all — used only so `--fallback` still has a
/// value to hand `evaluate` in that case.
fn infer_untyped(v: &serde_json::Value) -> FeatureValue {
    match v {
        serde_json::Value::Bool(b) => FeatureValue::Bool(*b),
        serde_json::Value::String(s) => FeatureValue::Str(s.clone()),
        serde_json::Value::Number(n) if n.is_i64() => FeatureValue::Int(n.as_i64().unwrap()),
        serde_json::Value::Number(n) => FeatureValue::Double(n.as_f64().unwrap_or_default()),
        serde_json::Value::Object(_) => FeatureValue::Object(v.clone()),
        other => FeatureValue::Str(other.to_string()),
    }
}

fn parse_fallback(raw: &str, ty: Option<FeatureType>) -> Result<FeatureValue, CliError> {
    let parsed: serde_json::Value = serde_json::from_str(raw).map_err(|e| CliError::BadFallback(e.to_string()))?;
    match ty {
        Some(ty) => value_from_typed(ty, &parsed),
        None => Ok(infer_untyped(&parsed)),
    }
}

fn run_eval(args: EvalArgs) -> Result<ExitCode, CliError> {
    let schema_raw = args::read_to_string(&args.schema, "--schema")?;
    let schema = load_schema(&schema_raw)?;
    let snapshot_raw = args::read_to_string(&args.snapshot, "--snapshot")?;
    let config = kdt_io::wire::decode(&snapshot_raw, &schema, load_options(args.skip_unknown_keys))
        .map_err(|e| CliError::Decode(e.to_string()))?;

    let registry = Registry::new(RegistryConfig::default());
    registry.load(config);
    let ctx = build_context(&args)?;

    if args.explain {
        let result = registry.explain(&args.feature, &ctx).map_err(|e| CliError::Evaluate(e.to_string()))?;
        let view = kdt_report::DiagnosticsView::new(&result.value, &result.diagnostics);
        print_diagnostics(&view, args.render.as_deref(), args.quiet)?;
        return Ok(ExitCode::SUCCESS);
    }

    let ty = schema.type_of(&args.feature);
    let value = match registry.evaluate_safely(&args.feature, &ctx) {
        Ok(value) => value,
        Err(kdt_core::errors::ParseError::FeatureNotFound(_)) => {
            let Some(raw) = &args.fallback else {
                return Err(CliError::Evaluate(format!(
                    "feature not declared and no --fallback given: {}",
                    args.feature
                )));
            };
            parse_fallback(raw, ty)?
        }
        Err(e) => return Err(CliError::Evaluate(e.to_string())),
    };

    if !args.quiet {
        println!("{}", display_value(&value));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_diff(args: DiffArgs) -> Result<ExitCode, CliError> {
    let schema_raw = args::read_to_string(&args.schema, "--schema")?;
    let schema = load_schema(&schema_raw)?;

    let base_raw = args::read_to_string(&args.base, "--base")?;
    let base = kdt_io::wire::decode(&base_raw, &schema, load_options(args.skip_unknown_keys))
        .map_err(|e| CliError::Decode(e.to_string()))?;

    let candidate_raw = args::read_to_string(&args.candidate, "--candidate")?;
    let candidate = kdt_io::wire::decode(&candidate_raw, &schema, load_options(args.skip_unknown_keys))
        .map_err(|e| CliError::Decode(e.to_string()))?;

    let registry = Registry::new(RegistryConfig::default());
    registry.load(base);
    let diff = registry.diff(&candidate);
    let view = kdt_report::DiffView::new(diff.added, diff.removed, diff.changed);

    print_diff(&view, args.render.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_validate(args: ValidateArgs) -> Result<ExitCode, CliError> {
    let schema_raw = args::read_to_string(&args.schema, "--schema")?;
    let schema = load_schema(&schema_raw)?;
    let snapshot_raw = args::read_to_string(&args.snapshot, "--snapshot")?;
    match kdt_io::wire::decode(&snapshot_raw, &schema, load_options(args.skip_unknown_keys)) {
        Ok(config) => {
            println!("ok: {} feature(s) decoded", config.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(CliError::Decode(e.to_string())),
    }
}

fn display_value(v: &FeatureValue) -> String {
    match v {
        FeatureValue::Bool(b) => b.to_string(),
        FeatureValue::Str(s) | FeatureValue::Enum(s) => s.clone(),
        FeatureValue::Int(i) => i.to_string(),
        FeatureValue::Double(d) => d.to_string(),
        FeatureValue::Object(o) => o.to_string(),
    }
}

#[cfg_attr(not(any(feature = "report-json", feature = "report-html")), allow(unused_variables))]
fn print_diagnostics(view: &kdt_report::DiagnosticsView, render: Option<&str>, quiet: bool) -> Result<(), CliError> {
    if quiet {
        return Ok(());
    }
    match render {
        #[cfg(feature = "report-json")]
        Some("json") | None => {
            let json =
                kdt_report::render_json::render_diagnostics_json(view).map_err(|e| CliError::BadSchema(e.to_string()))?;
            println!("{json}");
        }
        #[cfg(feature = "report-html")]
        Some("html") => {
            let html =
                kdt_report::render_html::render_diagnostics_html(view).map_err(|e| CliError::BadSchema(e.to_string()))?;
            println!("{html}");
        }
        _ => {
            println!("{}", display_value(&view.value));
        }
    }
    Ok(())
}

#[cfg_attr(not(any(feature = "report-json", feature = "report-html")), allow(unused_variables))]
fn print_diff(view: &kdt_report::DiffView, render: Option<&str>) -> Result<(), CliError> {
    match render {
        #[cfg(feature = "report-json")]
        Some("json") | None => {
            let json = kdt_report::render_json::render_diff_json(view).map_err(|e| CliError::BadSchema(e.to_string()))?;
            println!("{json}");
        }
        #[cfg(feature = "report-html")]
        Some("html") => {
            let html = kdt_report::render_html::render_diff_html(view).map_err(|e| CliError::BadSchema(e.to_string()))?;
            println!("{html}");
        }
        _ => {
            println!("added={:?} removed={:?} changed={:?}", view.added, view.removed, view.changed);
        }
    }
    Ok(())
}
