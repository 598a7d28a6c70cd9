use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
};
use cut_planner::types::{Piece, Rectangle, RemnantBar, RemnantSheet, StockLength, StockSheet};
use cut_planner::{BarOptions, BarSolver, Outcome, PlanError, SheetOptions, SheetSolver};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct BarsRequest {
    stock: Vec<StockLengthRequest>,
    #[serde(default)]
    remnants: Vec<RemnantBar>,
    cuts: Vec<Piece>,
    #[serde(default)]
    options: BarOptions,
}

/// Stock lengths may be sent as bare numbers or full catalog rows.
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum StockLengthRequest {
    Length(u32),
    Row(StockLength),
}

impl From<StockLengthRequest> for StockLength {
    fn from(req: StockLengthRequest) -> Self {
        match req {
            StockLengthRequest::Length(len) => StockLength::new(len),
            StockLengthRequest::Row(row) => row,
        }
    }
}

#[derive(Deserialize, Serialize)]
struct SheetsRequest {
    stock: Vec<StockSheet>,
    #[serde(default)]
    remnants: Vec<RemnantSheet>,
    cuts: Vec<Rectangle>,
    #[serde(default)]
    options: SheetOptions,
}

fn status_for(result: &Result<impl Sized, PlanError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(PlanError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        Err(PlanError::Infeasible(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(PlanError::Internal(msg)) => {
            sentry::capture_message(msg, sentry::Level::Error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

type Reply<T> = (StatusCode, Json<Outcome<T>>);

/// A body that does not parse still answers in the `Outcome` shape.
fn rejected<T>(rejection: JsonRejection) -> Reply<T> {
    tracing::warn!(error = %rejection.body_text(), "rejected request body");
    let outcome = Outcome::from(Err::<T, _>(PlanError::InvalidInput(rejection.body_text())));
    (StatusCode::BAD_REQUEST, Json(outcome))
}

async fn bars(payload: Result<Json<BarsRequest>, JsonRejection>) -> Reply<cut_planner::BarPlan> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected(rejection),
    };
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /bars"
    );

    let stock = req.stock.into_iter().map(StockLength::from).collect();
    let solver = BarSolver::new(stock, req.remnants, req.options);
    let result = solver.solve(&req.cuts);
    (status_for(&result), Json(result.into()))
}

async fn sheets(
    payload: Result<Json<SheetsRequest>, JsonRejection>,
) -> Reply<cut_planner::SheetPlan> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected(rejection),
    };
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /sheets"
    );

    let solver = SheetSolver::new(req.stock, req.remnants, req.options);
    let result = solver.solve(&req.cuts);
    (status_for(&result), Json(result.into()))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/bars", post(bars))
        .route("/sheets", post(sheets))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let _sentry = sentry::init(sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.expect("server error");
}
