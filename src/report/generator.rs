//! Report generation.
//!
//! This module renders a [`Report`] as Markdown tables or pretty JSON.

use crate::analysis::{ranked_categories, total_ratings};
use crate::models::{
    Averages, CategorySummary, Comment, FailedDocument, Report, ReportMetadata, Workflow,
    OVERALL_CATEGORY,
};
use crate::view::{AbortedWorkflow, ReviewsView, SkippedRating};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Review Averages\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    for document in &report.documents {
        output.push_str(&generate_document_section(document));
    }

    output.push_str(&generate_failures_section(&report.failures));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Documents:** {}\n",
        metadata.documents_loaded
    ));
    if metadata.documents_failed > 0 {
        section.push_str(&format!(
            "- **Documents Failed:** {}\n",
            metadata.documents_failed
        ));
    }
    section.push('\n');

    section
}

/// Generate the section for one document.
fn generate_document_section(document: &ReviewsView) -> String {
    let mut section = String::new();

    let heading = if document.title.is_empty() {
        document.document_id.as_str()
    } else {
        document.title.as_str()
    };
    section.push_str(&format!("## {}\n\n", heading));
    section.push_str(&format!("*Document: `{}`*\n\n", document.document_id));

    if let Some(ref description) = document.description {
        section.push_str(description);
        section.push_str("\n\n");
    }

    if document.rated_workflows().next().is_none() {
        section.push_str("No ratings on this document yet.\n\n");
    }

    for (index, workflow) in document.workflows.iter().enumerate() {
        if workflow.ratings.is_empty() && workflow.name.is_empty() {
            // Comments-only entry appended by the server.
            section.push_str(&generate_comments_block("Comments", &workflow.comments));
        } else {
            section.push_str(&generate_workflow_block(workflow, document.aborted_at(index)));
        }
    }

    section.push_str(&generate_skipped_block(&document.skipped));

    section
}

/// Generate the block for one workflow.
fn generate_workflow_block(workflow: &Workflow, aborted: Option<&AbortedWorkflow>) -> String {
    let mut block = String::new();

    let name = if workflow.name.is_empty() {
        "Unnamed workflow"
    } else {
        workflow.name.as_str()
    };
    block.push_str(&format!("### {}\n\n", name));

    if let Some(aborted) = aborted {
        block.push_str(&format!("*Aggregation aborted: {}*\n\n", aborted.reason));
    } else if workflow.ratings.is_empty() {
        block.push_str("No ratings yet.\n\n");
    } else {
        block.push_str(&format!(
            "*{} of {} ratings counted*\n\n",
            total_ratings(&workflow.averages),
            workflow.ratings.len()
        ));
        block.push_str(&generate_averages_table(&workflow.averages));

        if let Some((category, average)) = ranked_categories(&workflow.averages).first() {
            block.push_str(&format!(
                "Strongest category: **{}** ({:.2})\n\n",
                category, average
            ));
        }
    }

    block.push_str(&generate_comments_block("Comments", &workflow.comments));

    block
}

/// Generate the averages table. "Overall" is always the last row.
fn generate_averages_table(averages: &Averages) -> String {
    let mut table = String::new();

    table.push_str("| Category | Ratings | Sum | Average |\n");
    table.push_str("|:---|:---:|:---:|:---:|\n");

    for (category, summary) in averages
        .iter()
        .filter(|(category, _)| category.as_str() != OVERALL_CATEGORY)
    {
        table.push_str(&format_row(category, summary, false));
    }

    if let Some(overall) = averages.get(OVERALL_CATEGORY) {
        table.push_str(&format_row(OVERALL_CATEGORY, overall, true));
    }
    table.push('\n');

    table
}

fn format_row(category: &str, summary: &CategorySummary, bold: bool) -> String {
    let average = summary
        .average()
        .map(|avg| format!("{:.2}", avg))
        .unwrap_or_else(|| "-".to_string());

    if bold {
        format!(
            "| **{}** | **{}** | **{}** | **{}** |\n",
            category, summary.count, summary.sum, average
        )
    } else {
        format!(
            "| {} | {} | {} | {} |\n",
            category, summary.count, summary.sum, average
        )
    }
}

fn generate_comments_block(title: &str, comments: &[Comment]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    block.push_str(&format!("**{}:**\n\n", title));
    for comment in comments {
        match comment.author {
            Some(ref author) => {
                block.push_str(&format!("> **{}:** {}\n>\n", author, comment.contents))
            }
            None => block.push_str(&format!("> {}\n>\n", comment.contents)),
        }
    }
    block.push('\n');

    block
}

fn generate_skipped_block(skipped: &[SkippedRating]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut block = String::new();
    block.push_str(&format!("**Skipped ratings ({}):**\n\n", skipped.len()));
    for entry in skipped {
        block.push_str(&format!("- {}: {}\n", entry.workflow, entry.reason));
    }
    block.push('\n');

    block
}

/// Generate the section listing documents that could not be loaded.
fn generate_failures_section(failures: &[FailedDocument]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Failed Documents\n\n");
    for failure in failures {
        section.push_str(&format!("- `{}`: {}\n", failure.document_id, failure.error));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by docreviews {}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
