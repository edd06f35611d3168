use histo_ensemble::config::{self, OutputFormat, RuntimeConfig};
use histo_ensemble::diagnostics::DetailedResult;
use histo_ensemble::image::io::{load_rgba_image, save_channel_png, write_json_file};
use histo_ensemble::stain::{StainChannel, StainChannels};
use histo_ensemble::DiagnosticPipeline;
use log::info;
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args
        .next()
        .unwrap_or_else(|| "histo_ensemble".to_string());
    let config = config::parse_cli(&program, args)?;

    let pipeline = DiagnosticPipeline::new(config.pipeline.clone()).map_err(|e| e.to_string())?;
    let rgba = load_rgba_image(&config.input_path)?;
    let image = rgba.as_view().map_err(|e| e.to_string())?;

    let start = Instant::now();
    let (detailed, channels) = pipeline
        .analyze_with_channels(image)
        .map_err(|e| e.to_string())?;
    info!(
        "analysed {} ({}x{}) in {:.3} ms",
        config.input_path.display(),
        rgba.width(),
        rgba.height(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    emit_reports(&config, &detailed)?;

    if let Some(dir) = &config.output.debug_dir {
        save_debug_artifacts(dir, &detailed, &channels)?;
        if config.output.format.includes_text() {
            println!("Debug artifacts written to {}", dir.display());
        } else {
            eprintln!("Debug artifacts written to {}", dir.display());
        }
    }

    Ok(())
}

fn emit_reports(config: &RuntimeConfig, detailed: &DetailedResult) -> Result<(), String> {
    let format = config.output.format;
    if format.includes_text() {
        print_text_summary(detailed);
    }
    if !format.includes_json() {
        return Ok(());
    }
    let result = &detailed.result;
    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, result)?;
            let sep = if format.includes_text() { "\n" } else { "" };
            println!("{sep}JSON report written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(result)
                .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
            if format == OutputFormat::Both {
                println!("\nJSON report:\n{json}");
            } else {
                println!("{json}");
            }
        }
    }
    Ok(())
}

fn print_text_summary(detailed: &DetailedResult) {
    let res = &detailed.result;
    println!("Diagnostic summary");
    println!("  category: {}", res.category);
    println!("  final_score: {:.3}", res.final_score);
    println!("  confidence: {:.3}", res.confidence);
    for (table, label) in &res.secondary_labels {
        println!("  {table}: {label}");
    }

    for (stage, ensemble) in [("math", &res.math), ("ai", &res.ai)] {
        println!(
            "\n{stage} ensemble: score={:.3} confidence={:.3}",
            ensemble.overall_score, ensemble.confidence
        );
        for (name, r) in &ensemble.breakdown {
            match &r.error {
                Some(err) => println!(
                    "  {name}: score={:.3} conf={:.3} degraded: {err}",
                    r.score, r.confidence
                ),
                None => println!("  {name}: score={:.3} conf={:.3}", r.score, r.confidence),
            }
        }
    }

    let diag = &detailed.diagnostics;
    println!("\nChannels ({}x{})", diag.input.width, diag.input.height);
    for c in &diag.channels {
        println!(
            "  {}: mean={:.2} std={:.2} range=[{:.1}, {:.1}] levels={}",
            c.channel.name(),
            c.mean,
            c.std_dev,
            c.min,
            c.max,
            c.distinct_levels
        );
    }
}

fn save_debug_artifacts(
    dir: &Path,
    detailed: &DetailedResult,
    channels: &StainChannels,
) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create debug dir {}: {e}", dir.display()))?;

    write_json_file(&dir.join("detailed_result.json"), detailed)?;

    for channel in StainChannel::ALL {
        let path = dir.join(format!("channel_{}.png", channel.name()));
        save_channel_png(channels.get(channel), &path)?;
    }

    Ok(())
}
