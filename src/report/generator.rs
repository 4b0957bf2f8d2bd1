//! Markdown and JSON report generation.
//!
//! This module renders a diagnostic report for the terminal or a file.

use crate::models::{
    ConditionReport, DiagnosisResult, DiagnosticReport, PriceReport, ReportMetadata,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DiagnosticReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# AgroDiag Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_diagnosis_section(&report.result.classification));
    output.push_str(&generate_conditions_section(&report.result.condition));
    output.push_str(&generate_prices_section(&report.result.price));
    output.push_str(&generate_degraded_section(&report.metadata.degraded));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **City:** {}\n", metadata.city));
    section.push_str(&format!("- **Crop:** {}\n", metadata.crop));
    section.push_str(&format!("- **Image:** `{}`\n", metadata.artifact));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

/// Generate the leaf diagnosis section.
fn generate_diagnosis_section(diagnosis: &DiagnosisResult) -> String {
    let mut section = String::new();

    section.push_str("## Leaf Diagnosis\n\n");
    section.push_str(&format!(
        "**{}** (confidence {:.0}%, severity {})\n\n",
        diagnosis.disease,
        diagnosis.confidence * 100.0,
        diagnosis.severity
    ));
    if !diagnosis.recommendation.is_empty() {
        section.push_str(&format!("> **Recommendation:** {}\n\n", diagnosis.recommendation));
    }
    if !diagnosis.explanation.is_empty() {
        section.push_str(&format!("{}\n\n", diagnosis.explanation));
    }

    section
}

/// Generate the field conditions section.
fn generate_conditions_section(condition: &ConditionReport) -> String {
    let mut section = String::new();

    section.push_str("## Field Conditions\n\n");
    section.push_str("| Condition | Temperature | Humidity | Wind | Precipitation |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        condition.condition,
        format_measure(condition.temperature, " °C"),
        format_measure(condition.humidity, "%"),
        format_measure(condition.wind_speed, " m/s"),
        format_measure(condition.precipitation, " mm"),
    ));

    if let Some(ref advisory) = condition.advisory {
        section.push_str(&format!("> **Advisory:** {}\n\n", advisory));
    }

    section
}

/// Generate the market prices section.
fn generate_prices_section(price: &PriceReport) -> String {
    let mut section = String::new();

    section.push_str("## Market Prices\n\n");
    section.push_str(&format!(
        "*{} in {} on {} (source: {})*\n\n",
        price.commodity.as_deref().unwrap_or("-"),
        price.city.as_deref().unwrap_or("-"),
        price.date,
        price.source
    ));

    if price.prices.is_empty() {
        section.push_str("No market prices available.\n\n");
        return section;
    }

    section.push_str("| Market | Min | Max | Modal |\n");
    section.push_str("|:---|---:|---:|---:|\n");
    for entry in &price.prices {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.market, entry.min_price, entry.max_price, entry.modal_price
        ));
    }
    section.push('\n');

    section
}

/// List the sections that fell back to stub content.
fn generate_degraded_section(degraded: &[String]) -> String {
    if degraded.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Notes\n\n");
    section.push_str("The following sections contain placeholder data because a backend was unavailable:\n\n");
    for name in degraded {
        section.push_str(&format!("- {}\n", name));
    }
    section.push('\n');

    section
}

fn format_measure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "n/a".to_string(),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by AgroDiag*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DiagnosticReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnalysisRequest, Artifact, CompositeResult, PriceEntry, DISEASE_UNKNOWN,
    };

    fn create_test_report() -> DiagnosticReport {
        let request = AnalysisRequest::new(
            Artifact::Path("uploads/leaf.jpg".into()),
            "Bangalore",
            "Potato",
        );
        let result = CompositeResult {
            classification: DiagnosisResult {
                disease: "Late Blight".to_string(),
                confidence: 0.87,
                severity: "high".to_string(),
                recommendation: "Apply copper fungicide".to_string(),
                explanation: "Water-soaked lesions".to_string(),
            },
            condition: ConditionReport {
                city: Some("Bangalore".to_string()),
                temperature: Some(24.3),
                humidity: Some(78.0),
                condition: "light rain".to_string(),
                wind_speed: Some(3.6),
                precipitation: None,
                advisory: Some("Rain expected".to_string()),
            },
            price: PriceReport {
                commodity: Some("Potato".to_string()),
                city: Some("Bangalore".to_string()),
                date: "2026-10-18".to_string(),
                prices: vec![PriceEntry {
                    market: "Yeshwanthpur".to_string(),
                    min_price: 1400.0,
                    max_price: 1900.0,
                    modal_price: 1650.0,
                }],
                source: "Agmarknet".to_string(),
            },
        };

        DiagnosticReport::new(&request, result, "llava:latest", 2.4)
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# AgroDiag Report"));
        assert!(markdown.contains("## Leaf Diagnosis"));
        assert!(markdown.contains("**Late Blight** (confidence 87%, severity high)"));
        assert!(markdown.contains("| light rain | 24.3 °C | 78% | 3.6 m/s | n/a |"));
        assert!(markdown.contains("| Yeshwanthpur | 1400 | 1900 | 1650 |"));
        assert!(!markdown.contains("## Notes"));
    }

    #[test]
    fn test_degraded_sections_are_listed() {
        let mut report = create_test_report();
        report.result.classification = DiagnosisResult::unconfigured("offline");
        report.result.price.prices.clear();
        report.metadata.degraded = vec!["classification".to_string()];

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains(&format!("**{}**", DISEASE_UNKNOWN)));
        assert!(markdown.contains("No market prices available."));
        assert!(markdown.contains("## Notes"));
        assert!(markdown.contains("- classification"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("Bangalore"));
        assert!(section.contains("`uploads/leaf.jpg`"));
        assert!(section.contains("`llava:latest`"));
        assert!(section.contains("2.4s"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"classification\""));
        assert!(json.contains("\"modal_price\""));
        assert!(json.contains("\"precipitation\": null"));
    }
}
