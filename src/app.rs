//! Query orchestration: one range query, then branch on the result shape.

use std::path::PathBuf;
use std::time::Duration;

use promscatter_client::{Range, RangeQuery};
use promscatter_types::{format_timestamp_ms, format_value, QueryResult};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Settings;
use crate::error::AppError;
use crate::plot::{count_points, flatten, PlotSpec, Renderer, Units};

/// What to query and where to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub query: String,
    /// Start of the window, as an offset before now.
    pub from: Duration,
    /// End of the window, as an offset before now.
    pub to: Duration,
    pub step: Duration,
    pub out: PathBuf,
    /// Lower bound applied to every plotted value.
    pub floor: f64,
    pub units: Units,
}

impl From<&Settings> for QueryOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            query: settings.query.clone(),
            from: settings.from,
            to: settings.to,
            step: settings.step,
            out: settings.out.clone(),
            floor: settings.floor,
            units: settings.units,
        }
    }
}

/// What a run did with the result. Logged results carry the lines written.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A scalar was logged.
    Scalar { line: String },
    /// A vector was logged, one line per sample.
    Vector { lines: Vec<String> },
    /// A matrix was rendered with this many points.
    Plotted { points: usize },
    /// A string was logged.
    String { line: String },
}

/// Runs a query against a backend and renders matrix results.
pub struct Orchestrator<Q, R> {
    backend: Q,
    renderer: R,
}

impl<Q: RangeQuery, R: Renderer> Orchestrator<Q, R> {
    pub fn new(backend: Q, renderer: R) -> Self {
        Self { backend, renderer }
    }

    pub fn backend(&self) -> &Q {
        &self.backend
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Issue one range query and handle its result.
    ///
    /// No timeout and no retry: the request runs until it completes, fails,
    /// or `cancel` fires.
    pub async fn run(
        &self,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<Outcome, AppError> {
        let range = Range::back_from_now(options.from, options.to, options.step);
        let result = self
            .backend
            .query_range(&options.query, range, cancel)
            .await?;

        match result {
            QueryResult::Scalar(scalar) => {
                let line = format!(
                    "scalar {}: {}",
                    format_timestamp_ms(scalar.timestamp_ms),
                    format_value(scalar.value)
                );
                info!("{}", line);
                Ok(Outcome::Scalar { line })
            }
            QueryResult::Vector(samples) => {
                let lines: Vec<String> = samples
                    .iter()
                    .map(|sample| {
                        format!(
                            "vector {:?} {}: {}",
                            sample.metric,
                            format_timestamp_ms(sample.sample.timestamp_ms),
                            format_value(sample.sample.value)
                        )
                    })
                    .collect();
                for line in &lines {
                    info!("{}", line);
                }
                Ok(Outcome::Vector { lines })
            }
            QueryResult::Matrix(series) => {
                let count = count_points(&series);
                info!("plotting {} points to {:?}", count, options.out);

                let points = flatten(&series, options.floor);
                let spec = PlotSpec::builder()
                    .title(options.query.as_str())
                    .units(options.units)
                    .path(options.out.clone())
                    .build()?;
                self.renderer.render(&spec, &points)?;

                Ok(Outcome::Plotted { points: count })
            }
            QueryResult::String(value) => {
                let line = format!(
                    "string {}: {}",
                    format_timestamp_ms(value.timestamp_ms),
                    value.value
                );
                info!("{}", line);
                Ok(Outcome::String { line })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use promscatter_client::{ClientError, TransportError};
    use promscatter_types::{Metric, Sample, Scalar, Series, StringValue, VectorSample};

    use crate::plot::{PlotError, Point};

    /// Backend returning a canned result and recording the queries it saw.
    struct MockBackend {
        result: Mutex<Option<Result<QueryResult, ClientError>>>,
        queries: Mutex<Vec<(String, Range)>>,
    }

    impl MockBackend {
        fn new(result: Result<QueryResult, ClientError>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RangeQuery for MockBackend {
        async fn query_range(
            &self,
            query: &str,
            range: Range,
            cancel: &CancellationToken,
        ) -> Result<QueryResult, ClientError> {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled.into());
            }
            self.queries.lock().unwrap().push((query.to_string(), range));
            self.result.lock().unwrap().take().expect("queried twice")
        }
    }

    /// Renderer recording each call.
    #[derive(Default)]
    struct MockRenderer {
        calls: Mutex<Vec<(String, PathBuf, Vec<Point>)>>,
    }

    impl Renderer for MockRenderer {
        fn render(&self, spec: &PlotSpec, points: &[Point]) -> Result<(), PlotError> {
            self.calls
                .lock()
                .unwrap()
                .push((spec.title.clone(), spec.path.clone(), points.to_vec()));
            Ok(())
        }
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _spec: &PlotSpec, _points: &[Point]) -> Result<(), PlotError> {
            Err(PlotError::Render("backend gone".to_string()))
        }
    }

    fn options() -> QueryOptions {
        QueryOptions {
            query: "up".to_string(),
            from: Duration::from_secs(7200),
            to: Duration::from_secs(1),
            step: Duration::from_secs(20),
            out: PathBuf::from("query.png"),
            floor: 1.0,
            units: Units::Unitless,
        }
    }

    fn series(samples: &[(i64, f64)]) -> Series {
        Series::new(
            Metric::new(),
            samples.iter().map(|&(ts, v)| Sample::new(ts, v)).collect(),
        )
    }

    #[tokio::test]
    async fn test_matrix_is_plotted() {
        let matrix = QueryResult::Matrix(vec![
            series(&[(1_000_000, 0.5)]),
            series(&[(1_000_000, 2.0)]),
        ]);
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(matrix)), MockRenderer::default());

        let outcome = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Plotted { points: 2 });
        let calls = orchestrator.renderer().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (title, path, points) = &calls[0];
        assert_eq!(title, "up");
        assert_eq!(path, &PathBuf::from("query.png"));
        assert_eq!(points, &vec![Point::new(1000.0, 1.0), Point::new(1000.0, 2.0)]);
    }

    #[tokio::test]
    async fn test_query_window_and_step() {
        let orchestrator = Orchestrator::new(
            MockBackend::new(Ok(QueryResult::Matrix(Vec::new()))),
            MockRenderer::default(),
        );

        orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        let queries = orchestrator.backend().queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        let (query, range) = &queries[0];
        assert_eq!(query, "up");
        assert_eq!(range.step, Duration::from_secs(20));
        assert_eq!((range.end - range.start).num_seconds(), 7199);
    }

    #[tokio::test]
    async fn test_scalar_is_not_rendered() {
        let scalar = QueryResult::Scalar(Scalar {
            timestamp_ms: 1_435_781_451_781,
            value: 1.0,
        });
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(scalar)), MockRenderer::default());

        let outcome = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Scalar {
                line: "scalar 1435781451.781: 1".to_string()
            }
        );
        assert!(orchestrator.renderer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vector_is_logged_only() {
        let vector = QueryResult::Vector(Vec::new());
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(vector)), MockRenderer::default());

        let outcome = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Vector { lines: Vec::new() });
        assert!(orchestrator.renderer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vector_lines_report_seconds() {
        let mut metric = Metric::new();
        metric.insert("job".to_string(), "node".to_string());
        let vector = QueryResult::Vector(vec![VectorSample {
            metric,
            sample: Sample::new(1_435_781_451_781, 0.5),
        }]);
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(vector)), MockRenderer::default());

        let outcome = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Vector {
                lines: vec![r#"vector {"job": "node"} 1435781451.781: 0.5"#.to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_string_is_logged_only() {
        let value = QueryResult::String(StringValue {
            timestamp_ms: 1_435_781_451_000,
            value: "hello".to_string(),
        });
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(value)), MockRenderer::default());

        let outcome = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::String {
                line: "string 1435781451: hello".to_string()
            }
        );
        assert!(orchestrator.renderer().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options();
        opts.out = dir.path().join("never.png");
        let orchestrator = Orchestrator::new(
            MockBackend::new(Err(ClientError::UnsupportedResult("histogram".to_string()))),
            MockRenderer::default(),
        );

        let err = orchestrator
            .run(&opts, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedResult(ref name) if name == "histogram"));
        assert!(orchestrator.renderer().calls.lock().unwrap().is_empty());
        assert!(!opts.out.exists());
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let orchestrator = Orchestrator::new(
            MockBackend::new(Err(ClientError::Api {
                error_type: "bad_data".to_string(),
                message: "parse error".to_string(),
            })),
            MockRenderer::default(),
        );

        let err = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Backend(ClientError::Api { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_query() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let orchestrator = Orchestrator::new(
            MockBackend::new(Ok(QueryResult::Matrix(Vec::new()))),
            MockRenderer::default(),
        );

        let err = orchestrator.run(&options(), &cancel).await.unwrap_err();

        assert!(matches!(err, AppError::Backend(ref e) if e.is_cancelled()));
    }

    #[tokio::test]
    async fn test_render_error_propagates() {
        let matrix = QueryResult::Matrix(vec![series(&[(0, 5.0)])]);
        let orchestrator = Orchestrator::new(MockBackend::new(Ok(matrix)), FailingRenderer);

        let err = orchestrator
            .run(&options(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Render(PlotError::Render(_))));
    }
}
