use pipeline_core::{
    AppViewModel, CostQuote, GenerationView, PipelineStage, PostKind, PostRow, Severity,
    StageStatus, StepStatus, Tab,
};
use pipeline_engine::HealthReport;

const BAR_WIDTH: usize = 24;
const TITLE_WIDTH: usize = 48;

pub fn render(view: &AppViewModel, updated_at: &str) -> String {
    let mut lines = Vec::new();

    if view.loading {
        lines.push("Loading queue...".to_string());
        return lines.join("\n");
    }

    lines.push(format!(
        "Content queue: {} posts reported, updated {}",
        view.total, updated_at
    ));
    lines.push(render_tabs(view));
    lines.push(render_pipeline(view));
    lines.push(String::new());

    lines.push(format!("{}:", view.active_tab.label()));
    if view.rows.is_empty() {
        lines.push("  (nothing here)".to_string());
    }
    lines.extend(view.rows.iter().map(render_row));

    if !view.generating.is_empty() {
        lines.push(String::new());
        lines.push("Generating:".to_string());
        for job in &view.generating {
            lines.extend(render_generation(job));
        }
    }

    if let Some(notice) = &view.notice {
        lines.push(String::new());
        let label = match notice.severity {
            Severity::Info => "OK",
            Severity::Error => "ERROR",
        };
        lines.push(format!("{label}: {}", notice.text));
    }

    lines.join("\n")
}

fn render_tabs(view: &AppViewModel) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let text = format!("{} {}", tab.label(), view.count(*tab));
            if *tab == view.active_tab {
                format!("[{text}]")
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_pipeline(view: &AppViewModel) -> String {
    let stages = PipelineStage::ALL
        .iter()
        .map(|stage| {
            let breakdown = [
                (StageStatus::Pending, "pending"),
                (StageStatus::Processing, "processing"),
                (StageStatus::Completed, "done"),
                (StageStatus::Failed, "failed"),
            ]
            .iter()
            .filter_map(|(status, label)| {
                let count = view.pipeline.count(*stage, *status);
                (count > 0).then(|| format!("{count} {label}"))
            })
            .collect::<Vec<_>>();
            if breakdown.is_empty() {
                format!("{} 0", stage.label())
            } else {
                format!(
                    "{} {} ({})",
                    stage.label(),
                    view.pipeline.stage_total(*stage),
                    breakdown.join(", ")
                )
            }
        })
        .collect::<Vec<_>>();
    format!("Pipeline: {}", stages.join(" | "))
}

fn render_row(row: &PostRow) -> String {
    let status = if row.effective_status != row.status {
        format!("{} (video ready)", row.effective_status)
    } else if row.generating {
        format!("{} *", row.status)
    } else {
        row.status.to_string()
    };
    let mut line = format!(
        "  #{:<5} {:<5} {:<24} {}",
        row.id,
        row.kind.as_str(),
        status,
        truncate(&row.title, TITLE_WIDTH)
    );
    if !row.platforms.is_empty() {
        line.push_str(&format!("  [{}]", row.platforms.join(", ")));
    }
    if row.regeneration_count > 0 {
        line.push_str(&format!("  regenerated x{}", row.regeneration_count));
    }
    if row.total_cost > 0.0 {
        line.push_str(&format!("  ${:.3}", row.total_cost));
    }
    if let Some(path) = &row.video_path {
        line.push_str(&format!("  -> {path}"));
    }
    line
}

fn render_generation(job: &GenerationView) -> Vec<String> {
    let title = job
        .title
        .as_deref()
        .filter(|title| !title.is_empty())
        .map(|title| format!(" {}", truncate(title, TITLE_WIDTH)))
        .unwrap_or_default();
    let Some(progress) = &job.progress else {
        return vec![format!("  #{}{}  starting...", job.post_id, title)];
    };

    let mut lines = vec![format!(
        "  #{}{}  {} {:>3.0}%  {} elapsed, {} left",
        job.post_id,
        title,
        progress_bar(progress.percent, BAR_WIDTH),
        progress.percent,
        progress.elapsed_label(),
        progress.remaining_label()
    )];
    for step in &progress.steps {
        let marker = match step.status {
            StepStatus::Complete => "x",
            StepStatus::InProgress => ">",
            StepStatus::Pending => " ",
        };
        lines.push(format!("      [{marker}] {}", step.label));
    }
    lines
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_quote(post_id: u64, kind: PostKind, quote: &CostQuote) -> String {
    format!(
        "Regenerating post {post_id} ({kind}): {} variant(s) at ${:.3} each = ${:.3} \
         (new content would cost ${:.2}, saving {}%)",
        quote.variants, quote.per_variant, quote.total, quote.new_content_cost, quote.savings_percent
    )
}

pub fn render_health(report: &HealthReport) -> String {
    let verdict = if report.is_healthy() {
        "healthy"
    } else {
        "unhealthy"
    };
    format!(
        "Backend {verdict}\n  api:       {}\n  database:  {}\n  scheduler: {}",
        or_unknown(&report.api),
        or_unknown(&report.database),
        or_unknown(&report.scheduler)
    )
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
