use crate::hat::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::HashMap;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "cohortName")]
    pub cohort_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "outputLayout")]
    pub output_layout: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            cohort_name: "cohort".to_string(),
            output_directory: None,
            output_layout: None,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "nameColumn")]
    pub name_column: Option<String>,
    #[serde(rename = "sidColumn")]
    pub sid_column: Option<String>,
    #[serde(rename = "flexibilitySuffix")]
    pub flexibility_suffix: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn simple(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            name_column: None,
            sid_column: None,
            flexibility_suffix: None,
            excel_worksheet_name: None,
        }
    }

    pub fn name_column(&self) -> &str {
        self.name_column.as_deref().unwrap_or("name")
    }

    pub fn sid_column(&self) -> &str {
        self.sid_column.as_deref().unwrap_or("sid")
    }

    pub fn flexibility_suffix(&self) -> &str {
        self.flexibility_suffix.as_deref().unwrap_or(" Flexibility")
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AttributeConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub selections: Vec<String>,
    #[serde(rename = "compatibilityMatrix", alias = "compatibility_matrix")]
    pub compatibility_matrix: HashMap<String, HashMap<String, JSValue>>,
    #[serde(rename = "defaultWeight", alias = "default_weight")]
    pub default_weight: JSValue,
    #[serde(rename = "enabledByDefault", alias = "enabled_by_default")]
    pub enabled_by_default: Option<bool>,
}

/// Overrides of the attribute defaults. The value "None" keeps the default.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomSettings {
    #[serde(default)]
    pub weights: HashMap<String, JSValue>,
    #[serde(default)]
    pub enabled: HashMap<String, JSValue>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnealingConfig {
    #[serde(rename = "initialTemperature")]
    pub initial_temperature: Option<JSValue>,
    #[serde(rename = "coolingRate")]
    pub cooling_rate: Option<JSValue>,
    #[serde(rename = "minTemperature")]
    pub min_temperature: Option<JSValue>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    pub strategy: Option<String>,
    #[serde(rename = "groupSize")]
    pub group_size: Option<JSValue>,
    #[serde(rename = "minGroupSize")]
    pub min_group_size: Option<JSValue>,
    #[serde(rename = "maxGroupSize")]
    pub max_group_size: Option<JSValue>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "useFlexibility")]
    pub use_flexibility: Option<bool>,
    pub annealing: Option<AnnealingConfig>,
}

impl RulesConfig {
    pub fn to_inputs(&self) -> HatResult<RuleInputs> {
        Ok(RuleInputs {
            strategy: self.strategy.clone(),
            group_size: read_js_opt_int(&self.group_size)?.map(|x| x as u32),
            min_group_size: read_js_opt_int(&self.min_group_size)?.map(|x| x as u32),
            max_group_size: read_js_opt_int(&self.max_group_size)?.map(|x| x as u32),
            use_flexibility: self.use_flexibility,
            seed: read_js_opt_int(&self.random_seed)?,
        })
    }

    pub fn annealing_schedule(&self) -> HatResult<AnnealingSchedule> {
        let default = AnnealingSchedule::DEFAULT_SCHEDULE;
        match &self.annealing {
            None => Ok(default),
            Some(a) => Ok(AnnealingSchedule {
                initial_temperature: read_js_opt_float(&a.initial_temperature)?
                    .unwrap_or(default.initial_temperature),
                cooling_rate: read_js_opt_float(&a.cooling_rate)?.unwrap_or(default.cooling_rate),
                min_temperature: read_js_opt_float(&a.min_temperature)?
                    .unwrap_or(default.min_temperature),
            }),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HatConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "inputSources", default)]
    pub input_sources: Vec<FileSource>,
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
    #[serde(rename = "customSettings")]
    pub custom_settings: Option<CustomSettings>,
    #[serde(default)]
    pub rules: RulesConfig,
}

/// An attribute of the catalog, with its activation status.
#[derive(PartialEq, Debug, Clone)]
pub struct AttributeSetting {
    pub attribute: Attribute,
    pub enabled: bool,
}

pub fn read_config(path: &str) -> HatResult<HatConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: HatConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> HatResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn is_none_marker(x: &JSValue) -> bool {
    matches!(x, JSValue::Null) || x.as_str().map(|s| s.trim() == "None").unwrap_or(false)
}

fn read_js_int(x: &JSValue) -> HatResult<u64> {
    match x {
        JSValue::Number(n) => n.as_u64().context(ParsingJsonNumberSnafu {
            content: n.to_string(),
        }),
        JSValue::String(s) => s.trim().parse::<u64>().ok().context(ParsingJsonNumberSnafu {
            content: s.clone(),
        }),
        _ => None.context(ParsingJsonNumberSnafu {
            content: x.to_string(),
        }),
    }
}

fn read_js_float(x: &JSValue) -> HatResult<f64> {
    match x {
        JSValue::Number(n) => n.as_f64().context(ParsingJsonNumberSnafu {
            content: n.to_string(),
        }),
        JSValue::String(s) => s.trim().parse::<f64>().ok().context(ParsingJsonNumberSnafu {
            content: s.clone(),
        }),
        _ => None.context(ParsingJsonNumberSnafu {
            content: x.to_string(),
        }),
    }
}

fn read_js_opt_int(x: &Option<JSValue>) -> HatResult<Option<u64>> {
    match x {
        Some(v) if !is_none_marker(v) => read_js_int(v).map(Some),
        _ => Ok(None),
    }
}

fn read_js_opt_float(x: &Option<JSValue>) -> HatResult<Option<f64>> {
    match x {
        Some(v) if !is_none_marker(v) => read_js_float(v).map(Some),
        _ => Ok(None),
    }
}

fn read_js_bool(x: &JSValue) -> Option<bool> {
    match x {
        JSValue::Bool(b) => Some(*b),
        JSValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn compatibility_matrix(def: &AttributeConfig) -> HatResult<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for s1 in def.selections.iter() {
        let mut row: Vec<f64> = Vec::new();
        for s2 in def.selections.iter() {
            let cell = def.compatibility_matrix.get(s1).and_then(|r| r.get(s2));
            match cell {
                Some(v) => row.push(read_js_float(v)?),
                None => {
                    whatever!(
                        "Attribute {}: no compatibility between {:?} and {:?}",
                        def.name,
                        s1,
                        s2
                    )
                }
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn custom_weight(def: &AttributeConfig, default_weight: f64, custom: &Option<CustomSettings>) -> f64 {
    match custom.as_ref().and_then(|c| c.weights.get(&def.name)) {
        Some(v) if !is_none_marker(v) => match read_js_float(v) {
            Ok(w) => w,
            Err(_) => {
                warn!(
                    "Invalid custom weight {} for attribute {}, using the default weight {}",
                    v, def.name, default_weight
                );
                default_weight
            }
        },
        _ => default_weight,
    }
}

fn custom_enabled(def: &AttributeConfig, custom: &Option<CustomSettings>) -> bool {
    let default_enabled = def.enabled_by_default.unwrap_or(true);
    match custom.as_ref().and_then(|c| c.enabled.get(&def.name)) {
        Some(v) if !is_none_marker(v) => read_js_bool(v).unwrap_or_else(|| {
            warn!(
                "Invalid enabled flag {} for attribute {}, keeping the default",
                v, def.name
            );
            default_enabled
        }),
        _ => default_enabled,
    }
}

/// Builds the catalog of attributes, with the custom weights and activations applied.
pub fn build_attributes(
    defs: &[AttributeConfig],
    custom: &Option<CustomSettings>,
) -> HatResult<Vec<AttributeSetting>> {
    let mut res: Vec<AttributeSetting> = Vec::new();
    for def in defs.iter() {
        let matrix = compatibility_matrix(def)?;
        let default_weight = read_js_float(&def.default_weight)?;
        let weight = custom_weight(def, default_weight, custom);
        let attribute = Attribute::new(&def.name, &def.description, &def.selections, &matrix, weight)
            .context(GroupingSnafu {})?;
        let enabled = custom_enabled(def, custom);
        debug!(
            "build_attributes: {} weight: {} enabled: {}",
            def.name, weight, enabled
        );
        res.push(AttributeSetting { attribute, enabled });
    }
    Ok(res)
}

/// The attributes enabled in the settings, plus the ones named in the input columns.
pub fn active_attributes(settings: &[AttributeSetting], columns: &[String]) -> Vec<Attribute> {
    settings
        .iter()
        .filter(|s| {
            let in_columns = columns.iter().any(|c| c.trim() == s.attribute.name);
            if in_columns && !s.enabled {
                info!("Activating attribute {} found in the input", s.attribute.name);
            }
            s.enabled || in_columns
        })
        .map(|s| s.attribute.clone())
        .collect()
}
