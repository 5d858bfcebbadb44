use crate::bws::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignSettings {
    #[serde(rename = "tupleSize")]
    pub tuple_size: Option<usize>,
    pub factor: Option<f64>,
    #[serde(rename = "numTuples")]
    pub num_tuples: Option<usize>,
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
    #[serde(rename = "timeBudgetMs")]
    pub time_budget_ms: Option<u64>,
    pub parallel: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(rename = "batchSize")]
    pub batch_size: Option<usize>,
    pub minimum: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "reportPath")]
    pub report_path: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(rename = "itemSources", default)]
    pub item_sources: Vec<String>,
    #[serde(default)]
    pub design: DesignSettings,
    #[serde(default)]
    pub batches: BatchSettings,
    #[serde(rename = "output", default)]
    pub output_settings: OutputSettings,
}

impl OutputSettings {
    /// Where the summary goes. Without an explicit path it is printed on the standard output.
    pub fn summary_target(&self) -> &str {
        self.summary_path.as_deref().unwrap_or(io_common::STDOUT)
    }
}

impl StudyConfig {
    /// Applies the command line options on top of the values of the file.
    pub fn merge_args(mut self, args: &GenerateArgs) -> StudyConfig {
        if !args.input.is_empty() {
            self.item_sources = args.input.clone();
        }
        let d = &mut self.design;
        d.tuple_size = args.tuple_size.or(d.tuple_size);
        d.factor = args.factor.or(d.factor);
        d.num_tuples = args.num_tuples.or(d.num_tuples);
        d.iterations = args.iterations.or(d.iterations);
        d.seed = args.seed.or(d.seed);
        d.time_budget_ms = args.time_budget_ms.or(d.time_budget_ms);
        if args.sequential {
            d.parallel = Some(false);
        }
        let b = &mut self.batches;
        b.batch_size = args.batch_size.or(b.batch_size);
        b.minimum = args.minimum.or(b.minimum);
        let o = &mut self.output_settings;
        o.summary_path = args.out.clone().or_else(|| o.summary_path.clone());
        o.report_path = args.report.clone().or_else(|| o.report_path.clone());
        self
    }

    pub fn design_rules(&self) -> DesignRules {
        let d = &self.design;
        DesignRules {
            tuple_size: d.tuple_size,
            factor: d.factor,
            num_tuples: d.num_tuples,
            num_iter: d.iterations.unwrap_or(DesignRules::DEFAULT_RULES.num_iter),
            seed: d.seed,
            time_budget: d.time_budget_ms.map(Duration::from_millis),
            parallel: d.parallel.unwrap_or(DesignRules::DEFAULT_RULES.parallel),
        }
    }

    /// The batches reuse the seed of the design, shifted so that both steps do not
    /// consume the same random sequence.
    pub fn batch_rules(&self) -> BatchRules {
        let b = &self.batches;
        BatchRules {
            batch_size: b
                .batch_size
                .unwrap_or(BatchRules::DEFAULT_RULES.batch_size),
            minimum: b.minimum.unwrap_or(BatchRules::DEFAULT_RULES.minimum),
            seed: self.design.seed.map(|s| s ^ BATCH_SEED_SALT),
        }
    }
}

const BATCH_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

pub fn read_config(path: &str) -> BwsResult<StudyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_config: {} bytes from {}", contents.len(), path);
    let config: StudyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let js = r#"{
            "itemSources": ["a.txt", "b.txt"],
            "design": {"tupleSize": 3, "factor": 1.5, "iterations": 7, "seed": 9,
                       "timeBudgetMs": 250, "parallel": false},
            "batches": {"batchSize": 10, "minimum": 2},
            "output": {"projectName": "demo", "summaryPath": "out.json"}
        }"#;
        let config: StudyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.item_sources, vec!["a.txt", "b.txt"]);
        let rules = config.design_rules();
        assert_eq!(rules.tuple_size, Some(3));
        assert_eq!(rules.factor, Some(1.5));
        assert_eq!(rules.num_iter, 7);
        assert_eq!(rules.time_budget, Some(Duration::from_millis(250)));
        assert!(!rules.parallel);
        let batch_rules = config.batch_rules();
        assert_eq!(batch_rules.batch_size, 10);
        assert_eq!(batch_rules.minimum, 2);
        assert!(batch_rules.seed.is_some());
        assert_eq!(config.output_settings.project_name.as_deref(), Some("demo"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: StudyConfig = serde_json::from_str("{}").unwrap();
        assert!(config.item_sources.is_empty());
        assert_eq!(config.design_rules(), DesignRules::DEFAULT_RULES);
        assert_eq!(config.batch_rules(), BatchRules::DEFAULT_RULES);
    }

    #[test]
    fn summary_defaults_to_stdout() {
        let config: StudyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.output_settings.summary_target(), "stdout");
        let js = r#"{"output": {"summaryPath": "design.json"}}"#;
        let config: StudyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.summary_target(), "design.json");
        let args = GenerateArgs {
            out: Some("".to_string()),
            ..GenerateArgs::default()
        };
        let config = config.merge_args(&args);
        assert_eq!(config.output_settings.summary_target(), "");
    }

    #[test]
    fn command_line_wins() {
        let js = r#"{"itemSources": ["a.txt"], "design": {"seed": 1, "iterations": 5}}"#;
        let config: StudyConfig = serde_json::from_str(js).unwrap();
        let args = GenerateArgs {
            input: vec!["b.txt".to_string()],
            seed: Some(2),
            sequential: true,
            batch_size: Some(8),
            out: Some("stdout".to_string()),
            ..GenerateArgs::default()
        };
        let merged = config.merge_args(&args);
        assert_eq!(merged.item_sources, vec!["b.txt"]);
        assert_eq!(merged.design.seed, Some(2));
        assert_eq!(merged.design.iterations, Some(5));
        assert_eq!(merged.design.parallel, Some(false));
        assert_eq!(merged.batches.batch_size, Some(8));
        assert_eq!(merged.output_settings.summary_path.as_deref(), Some("stdout"));
    }
}
