//! Processing Pipeline: sequences MarkupProcessing → MarkdownConversion →
//! TextExtraction with per-stage timing and isolated errors (spec §4.8).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use trawl_types::scrape::{
    MarkupStats, PipelineStage, ProcessedContent, ProcessingMetadata, StageError, TextStats,
};

use crate::html::{self, HtmlProcessorConfig};
use crate::markdown;
use crate::text::{self, TextProcessorConfig};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub run_markup_processing: bool,
    pub run_markdown_conversion: bool,
    pub run_text_extraction: bool,
    /// Stop running subsequent stages after the first stage error, rather
    /// than continuing with isolated errors (spec §4.8: off by default).
    pub stop_on_error: bool,
    /// Preserve `raw_markup` as the pre-clean input; when `false`,
    /// `raw_markup` holds the cleaned markup instead (spec §3).
    pub preserve_original: bool,
    pub html: HtmlProcessorConfig,
    pub text: TextProcessorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run_markup_processing: true,
            run_markdown_conversion: true,
            run_text_extraction: true,
            stop_on_error: false,
            preserve_original: true,
            html: HtmlProcessorConfig::default(),
            text: TextProcessorConfig::default(),
        }
    }
}

/// Rolling stats kept across pipeline invocations (spec §4.8).
#[derive(Debug, Default)]
pub struct PipelineStats {
    total_executions: AtomicU64,
    total_errors: AtomicU64,
    total_execution_time_ms: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, elapsed_ms: u64, error_count: usize) {
        self.total_executions.fetch_add(1, Ordering::Relaxed);
        self.total_errors
            .fetch_add(error_count as u64, Ordering::Relaxed);
        self.total_execution_time_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    pub fn average_execution_time_ms(&self) -> f64 {
        let n = self.total_executions();
        if n == 0 {
            return 0.0;
        }
        self.total_execution_time_ms.load(Ordering::Relaxed) as f64 / n as f64
    }
}

/// Run the full pipeline over `raw_html`, producing [`ProcessedContent`].
/// A stage error never prevents the remaining stages from running unless
/// `config.stop_on_error` is set (spec §4.8).
pub fn run(raw_html: &str, config: &PipelineConfig, stats: &PipelineStats) -> ProcessedContent {
    let start = Instant::now();
    let mut metadata = ProcessingMetadata {
        markup_stats: MarkupStats {
            original_len: raw_html.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut clean_markup = raw_html.to_string();
    let mut main_content: Option<String> = None;

    if config.run_markup_processing {
        let stage_start = Instant::now();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let truncated = html::truncate_if_needed(raw_html, &config.html);
            let cleaned = html::clean(&truncated, &config.html);
            let main = html::extract_main_content(&cleaned);
            let sanitized_main = main.as_ref().map(|m| html::sanitize(m, &config.html));
            (cleaned, sanitized_main)
        }));

        match result {
            Ok((cleaned, main)) => {
                metadata.markup_stats.clean_len = cleaned.len();
                metadata.markup_stats.main_len = main.as_ref().map(|m| m.len());
                clean_markup = cleaned;
                main_content = main;
                metadata.stages_executed.push(PipelineStage::MarkupProcessing);
            }
            Err(_) => {
                metadata.errors.push(StageError {
                    stage: PipelineStage::MarkupProcessing,
                    message: "markup processing stage panicked".to_string(),
                });
                if config.stop_on_error {
                    return finish(
                        raw_html,
                        clean_markup,
                        main_content,
                        String::new(),
                        String::new(),
                        metadata,
                        start,
                        config,
                        stats,
                    );
                }
            }
        }
        metadata
            .per_stage_timings
            .insert(PipelineStage::MarkupProcessing, stage_start.elapsed().as_millis() as u64);
    }

    let markdown_input = main_content.as_deref().unwrap_or(&clean_markup);

    let mut markdown_out = String::new();
    if config.run_markdown_conversion {
        let stage_start = Instant::now();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            markdown::convert(markdown_input)
        }));
        match result {
            Ok(md) => {
                markdown_out = md;
                metadata.stages_executed.push(PipelineStage::MarkdownConversion);
            }
            Err(_) => {
                markdown_out = markdown::fallback_to_text(markdown_input);
                metadata.errors.push(StageError {
                    stage: PipelineStage::MarkdownConversion,
                    message: "markdown conversion failed, fell back to text extraction".to_string(),
                });
                if config.stop_on_error {
                    return finish(
                        raw_html,
                        clean_markup,
                        main_content,
                        markdown_out,
                        String::new(),
                        metadata,
                        start,
                        config,
                        stats,
                    );
                }
            }
        }
        metadata.per_stage_timings.insert(
            PipelineStage::MarkdownConversion,
            stage_start.elapsed().as_millis() as u64,
        );
    }

    // Text stage prefers main_content over clean_markup over raw_markup (spec §4.8).
    let text_input = main_content
        .as_deref()
        .or(Some(clean_markup.as_str()))
        .unwrap_or(raw_html);

    let mut text_out = String::new();
    if config.run_text_extraction {
        let stage_start = Instant::now();
        metadata.text_stats.original_len = text_input.len();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let extracted = text::extract_from_html(text_input, text::ExtractionMode::Flat);
            text::process(&extracted, &config.text)
        }));
        match result {
            Ok(processed) => {
                metadata.text_stats.processed_len = processed.len();
                text_out = processed;
                metadata.stages_executed.push(PipelineStage::TextExtraction);
            }
            Err(_) => {
                metadata.errors.push(StageError {
                    stage: PipelineStage::TextExtraction,
                    message: "text extraction stage panicked".to_string(),
                });
            }
        }
        metadata
            .per_stage_timings
            .insert(PipelineStage::TextExtraction, stage_start.elapsed().as_millis() as u64);
    }

    finish(
        raw_html,
        clean_markup,
        main_content,
        markdown_out,
        text_out,
        metadata,
        start,
        config,
        stats,
    )
}

#[allow(clippy::too_many_arguments)]
fn finish(
    raw_html: &str,
    clean_markup: String,
    main_content: Option<String>,
    markdown: String,
    text: String,
    mut metadata: ProcessingMetadata,
    start: Instant,
    config: &PipelineConfig,
    stats: &PipelineStats,
) -> ProcessedContent {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    metadata.execution_time_ms = elapsed_ms;
    stats.record(elapsed_ms, metadata.errors.len());

    let raw_markup = if config.preserve_original {
        raw_html.to_string()
    } else {
        clean_markup.clone()
    };

    ProcessedContent {
        raw_markup,
        clean_markup,
        main_content,
        markdown,
        text,
        metadata,
    }
}
