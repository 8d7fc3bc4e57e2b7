mod executor;

use crate::catalog::ObservedPrices;
use crate::config::{BrowserConfig, Config};
use crate::driver::{EokaDriver, PageDriver};
use crate::Result;
use executor::ScenarioContext;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of running a scenario.
#[derive(Debug)]
pub struct RunResult {
    /// Whether the run succeeded.
    pub success: bool,
    /// Error message of the last failed attempt.
    pub error: Option<String>,
    /// Price texts seen by the luxury scan, when the last error came from it.
    pub observed: Option<ObservedPrices>,
    /// Steps completed by the last attempt.
    pub steps_executed: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Number of retry attempts made.
    pub retries: u32,
}

/// Executes scenarios against a page driver.
pub struct Runner<D: PageDriver> {
    driver: D,
}

impl Runner<EokaDriver> {
    /// Launch a browser and wrap it in a runner.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        Ok(Self::with_driver(EokaDriver::launch(config).await?))
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.driver.close().await
    }
}

impl<D: PageDriver> Runner<D> {
    pub fn with_driver(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run the scenario, retrying it from the first step in a fresh session
    /// on failure.
    ///
    /// Step errors are reported in the [`RunResult`]; only failures outside
    /// the scenario itself are returned as `Err`.
    pub async fn run(&mut self, config: &Config) -> Result<RunResult> {
        let start = Instant::now();
        let retry_config = config.on_failure.as_ref().and_then(|f| f.retry.as_ref());
        let max_attempts = retry_config.map(|r| r.attempts).unwrap_or(1);
        let retry_delay = retry_config.map(|r| r.delay_ms).unwrap_or(0);

        let mut last_error = None;
        let mut last_observed = None;
        let mut last_steps_executed = 0;
        let mut retries = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                retries += 1;
                info!("Retry attempt {}/{}", attempt, max_attempts);
                if retry_delay > 0 {
                    self.driver.wait_ms(retry_delay).await;
                }
            }

            let mut ctx = ScenarioContext::default();
            match self.run_once(config, &mut ctx).await {
                Ok(()) => {
                    return Ok(RunResult {
                        success: true,
                        error: None,
                        observed: None,
                        steps_executed: ctx.steps_executed,
                        duration_ms: start.elapsed().as_millis() as u64,
                        retries,
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e.to_string());
                    last_observed = e.observed().cloned();
                    last_steps_executed = ctx.steps_executed;
                    if attempt == max_attempts {
                        self.handle_failure(config).await;
                    }
                }
            }
        }

        Ok(RunResult {
            success: false,
            error: last_error,
            observed: last_observed,
            steps_executed: last_steps_executed,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }

    async fn handle_failure(&self, config: &Config) {
        let Some(path) = config
            .on_failure
            .as_ref()
            .and_then(|f| f.screenshot.as_ref())
        else {
            return;
        };
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let path = path.replace("{timestamp}", &timestamp);
        info!("Saving failure screenshot to: {}", path);
        match self.driver.screenshot().await {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to save screenshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to capture screenshot: {}", e),
        }
    }

    /// One attempt, on a fresh session so nothing from a failed attempt
    /// carries over.
    async fn run_once(&self, config: &Config, ctx: &mut ScenarioContext) -> Result<()> {
        info!("Running: {}", config.name);
        self.driver.reset().await?;
        for (i, step) in config.steps.iter().enumerate() {
            debug!("Executing step {}: {}", i + 1, step.name());
            executor::execute_step(&self.driver, &config.storefront, step, ctx).await?;
            ctx.steps_executed += 1;
        }
        Ok(())
    }
}
