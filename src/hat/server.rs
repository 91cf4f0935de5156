// The upload service used by the browser front end.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::hat::*;

/// The strategy of the legacy upload endpoint, when the form does not name one.
const DEFAULT_UPLOAD_STRATEGY: &str = "preference";
const DOWNLOAD_NAME: &str = "grouped_students.csv";

/// What the service knows before any upload: the attribute catalog and the default rules.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub attributes: Vec<AttributeSetting>,
    pub rules: RuleInputs,
    pub annealing: AnnealingSchedule,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            attributes: Vec::new(),
            rules: RuleInputs {
                strategy: Some(DEFAULT_UPLOAD_STRATEGY.to_string()),
                ..RuleInputs::default()
            },
            annealing: AnnealingSchedule::DEFAULT_SCHEDULE,
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &HatConfig) -> HatResult<ServiceSettings> {
        let defaults = ServiceSettings::default();
        Ok(ServiceSettings {
            attributes: build_attributes(&config.attributes, &config.custom_settings)?,
            rules: config.rules.to_inputs()?.or(&defaults.rules),
            annealing: config.rules.annealing_schedule()?,
        })
    }
}

pub fn app(settings: ServiceSettings) -> Router {
    Router::new()
        .route("/test", get(test_cors))
        .route("/upload", post(upload_file))
        .route("/groups/move", post(move_group_member))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(settings))
}

pub async fn serve(addr: &str, settings: ServiceSettings) -> HatResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .context(ServingSnafu { addr })?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app(settings))
        .await
        .context(ServingSnafu { addr })?;
    Ok(())
}

async fn test_cors() -> &'static str {
    "CORS is working"
}

fn bad_request(message: String) -> Response {
    warn!("Rejecting request: {}", message);
    (StatusCode::BAD_REQUEST, message).into_response()
}

#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Vec<u8>,
    group_size: Option<String>,
    min_group_size: Option<String>,
    max_group_size: Option<String>,
    strategy: Option<String>,
    input_type: Option<String>,
    use_flexibility: Option<String>,
    attributes: Vec<String>,
    weights: Vec<(String, String)>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            form.file_name = Some(field.file_name().unwrap_or("").to_string());
            form.file = field.bytes().await.map_err(|e| e.to_string())?.to_vec();
            continue;
        }
        let value = field.text().await.map_err(|e| e.to_string())?;
        match name.as_str() {
            "group_size" => form.group_size = Some(value),
            "min_group_size" => form.min_group_size = Some(value),
            "max_group_size" => form.max_group_size = Some(value),
            "strategy" => form.strategy = Some(value),
            "input_type" => form.input_type = Some(value),
            "use_flexibility" => form.use_flexibility = Some(value),
            "attribute" => form.attributes.push(value),
            n => match n.strip_prefix("weight:") {
                Some(attr) => form.weights.push((attr.to_string(), value)),
                None => debug!("read_form: ignoring field {:?}", n),
            },
        }
    }
    Ok(form)
}

fn parse_group_size(value: &Option<String>) -> Result<u32, String> {
    let s = value.as_deref().ok_or("No group size provided")?;
    let size = s
        .trim()
        .parse::<u32>()
        .map_err(|_| "Invalid group size".to_string())?;
    if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&size) {
        return Err(format!(
            "Group size must be between {} and {}",
            MIN_GROUP_SIZE, MAX_GROUP_SIZE
        ));
    }
    Ok(size)
}

fn parse_bound(value: &Option<String>, label: &str) -> Result<Option<u32>, String> {
    match value.as_deref().map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("Invalid {} group size", label)),
    }
}

fn parse_flag(value: &Option<String>) -> Result<Option<bool>, String> {
    match value.as_deref().map(|s| s.trim().to_lowercase()) {
        None => Ok(None),
        Some(s) => match s.as_str() {
            "" => Ok(None),
            "true" | "1" | "on" | "yes" => Ok(Some(true)),
            "false" | "0" | "off" | "no" => Ok(Some(false)),
            _ => Err(format!("Invalid flexibility flag {:?}", s)),
        },
    }
}

// The form may select the attributes and change their weights.
fn select_attributes(
    settings: &ServiceSettings,
    form: &UploadForm,
    cohort: &Cohort,
) -> Result<Vec<Attribute>, String> {
    let mut catalog = settings.attributes.clone();
    for (name, value) in form.weights.iter() {
        let setting = catalog
            .iter_mut()
            .find(|s| s.attribute.name == *name)
            .ok_or_else(|| format!("Unknown attribute {}", name))?;
        let weight = value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid weight for {}", name))?;
        let a = &setting.attribute;
        setting.attribute = Attribute::new(&a.name, &a.description, &a.selections, &a.compatibility, weight)
            .map_err(|e| e.to_string())?;
    }
    if form.attributes.is_empty() {
        return Ok(cohort_attributes(cohort, &catalog));
    }
    if cohort.from_canvas {
        return Err("Attributes cannot be selected for a Canvas export".to_string());
    }
    form.attributes
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find(|s| s.attribute.name == *name)
                .map(|s| s.attribute.clone())
                .ok_or_else(|| format!("Unknown attribute {}", name))
        })
        .collect()
}

fn process_upload(
    settings: &ServiceSettings,
    form: &UploadForm,
    file_name: &str,
    group_size: u32,
) -> Result<String, String> {
    let input_type = form.input_type.as_deref().unwrap_or("auto");
    let cohort = read_uploaded_cohort(file_name, &form.file, input_type).map_err(|e| e.to_string())?;
    info!("Upload {}: {} students", file_name, cohort.people.len());
    let attributes = select_attributes(settings, form, &cohort)?;
    let inputs = RuleInputs {
        strategy: form.strategy.clone().filter(|s| !s.trim().is_empty()),
        group_size: Some(group_size),
        min_group_size: parse_bound(&form.min_group_size, "minimum")?,
        max_group_size: parse_bound(&form.max_group_size, "maximum")?,
        use_flexibility: parse_flag(&form.use_flexibility)?,
        seed: None,
    }
    .or(&settings.rules);
    let rules = validate_rules(&inputs, settings.annealing).map_err(|e| e.to_string())?;
    let result = group_cohort(&cohort, &attributes, &rules).map_err(|e| e.to_string())?;
    GroupTable::from_result(&result)
        .to_csv(OutputLayout::Joined)
        .map_err(|e| e.to_string())
}

async fn upload_file(
    State(settings): State<Arc<ServiceSettings>>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let file_name = match &form.file_name {
        None => return bad_request("No file part in the request".to_string()),
        Some(name) if name.is_empty() => return bad_request("No selected file".to_string()),
        Some(name) => name.clone(),
    };
    let group_size = match parse_group_size(&form.group_size) {
        Ok(size) => size,
        Err(e) => return bad_request(e),
    };
    match process_upload(&settings, &form, &file_name, group_size) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", DOWNLOAD_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => bad_request(e),
    }
}

/// A drag and drop in the group editor. Groups and indexes start at 0.
#[derive(Debug, Deserialize)]
struct MoveRequest {
    csv: String,
    #[serde(rename = "fromGroup")]
    from_group: usize,
    #[serde(rename = "fromIndex")]
    from_index: usize,
    #[serde(rename = "toGroup")]
    to_group: usize,
    #[serde(rename = "toIndex")]
    to_index: usize,
}

fn apply_move(req: &MoveRequest) -> HatResult<String> {
    let (mut table, layout) = GroupTable::parse_csv(&req.csv)?;
    table.move_member(req.from_group, req.from_index, req.to_group, req.to_index)?;
    table.to_csv(layout)
}

async fn move_group_member(Json(req): Json<MoveRequest>) -> Response {
    match apply_move(&req) {
        Ok(csv) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/csv")], csv).into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}
