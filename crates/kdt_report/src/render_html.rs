//! Compact HTML rendering of the view models in [`crate::structure`], using
//! an embedded `minijinja` template — no external assets, no network.

use crate::structure::{DiagnosticsView, DiffView};
use crate::ReportError;
use minijinja::{context, Environment};

static DIAGNOSTICS_TEMPLATE: &str = r#"<!doctype html>
<html lang="en"><meta charset="utf-8">
<title>Evaluation trace — {{ feature_id }}</title>
<h1>{{ feature_id }}</h1>
<p><strong>Value:</strong> {{ value }}{% if used_default %} (default){% endif %}</p>
{% if feature_disabled %}<p>Feature disabled (isActive=false)</p>{% endif %}
{% if missing_stable_id %}<p>No stable id supplied; ramp-up gated rules could not be bucketed</p>{% endif %}
{% if bucket is not none %}<p>Bucket: {{ bucket }}</p>{% endif %}
<h2>Rule outcomes</h2>
<ol>
{% for r in rules %}
  <li>rule {{ r.rule_index }} — targeting={{ r.targeting_matched }}, allowlisted={{ r.allowlisted }},
      rampup_admitted={{ r.rampup_admitted }}, selected={{ r.selected }}</li>
{% endfor %}
</ol>
</html>
"#;

static DIFF_TEMPLATE: &str = r#"<!doctype html>
<html lang="en"><meta charset="utf-8">
<title>Configuration diff</title>
<h1>Configuration diff</h1>
<h2>Added ({{ added | length }})</h2>
<ul>{% for id in added %}<li>{{ id }}</li>{% endfor %}</ul>
<h2>Removed ({{ removed | length }})</h2>
<ul>{% for id in removed %}<li>{{ id }}</li>{% endfor %}</ul>
<h2>Changed ({{ changed | length }})</h2>
<ul>{% for id in changed %}<li>{{ id }}</li>{% endfor %}</ul>
</html>
"#;

fn feature_value_display(v: &crate::structure::FeatureValueView) -> String {
    use crate::structure::FeatureValueView as FV;
    match v {
        FV::Bool(b) => b.to_string(),
        FV::Str(s) | FV::Enum(s) => s.clone(),
        FV::Int(i) => i.to_string(),
        FV::Double(d) => d.to_string(),
        FV::Object(o) => o.to_string(),
    }
}

pub fn render_diagnostics_html(view: &DiagnosticsView) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template("diagnostics.html", DIAGNOSTICS_TEMPLATE)
        .map_err(|e| ReportError::Template(e.to_string()))?;
    let tmpl = env
        .get_template("diagnostics.html")
        .map_err(|e| ReportError::Template(e.to_string()))?;

    let ctx = context! {
        feature_id => &view.feature_id,
        value => feature_value_display(&view.value),
        used_default => view.used_default,
        bucket => view.bucket,
        feature_disabled => view.feature_disabled,
        missing_stable_id => view.missing_stable_id,
        rules => view.rule_outcomes.iter().map(|r| {
            context! {
                rule_index => r.rule_index,
                targeting_matched => r.targeting_matched,
                allowlisted => r.allowlisted,
                rampup_admitted => r.rampup_admitted,
                selected => r.selected,
            }
        }).collect::<Vec<_>>(),
    };

    tmpl.render(ctx).map_err(|e| ReportError::Template(e.to_string()))
}

pub fn render_diff_html(view: &DiffView) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.add_template("diff.html", DIFF_TEMPLATE)
        .map_err(|e| ReportError::Template(e.to_string()))?;
    let tmpl = env.get_template("diff.html").map_err(|e| ReportError::Template(e.to_string()))?;

    let ctx = context! {
        added => &view.added,
        removed => &view.removed,
        changed => &view.changed,
    };

    tmpl.render(ctx).map_err(|e| ReportError::Template(e.to_string()))
}
