//! Provider failover: try meal-plan providers in priority order, skip ones
//! that failed recently, and cap outbound call volume with a sliding window.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::models::{InventoryItem, MealPlan};
use crate::planner::{MealPlanProvider, MealPlanRequest};

/// Sliding-window rate limiter over all provider attempts.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_calls: usize,
    calls: VecDeque<Instant>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub const fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            window,
            max_calls,
            calls: VecDeque::new(),
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> bool {
        while let Some(front) = self.calls.front() {
            if now.duration_since(*front) >= self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
        if self.calls.len() >= self.max_calls {
            return false;
        }
        self.calls.push_back(now);
        true
    }
}

/// Tracks which providers are sitting out after a failure.
pub struct ProviderHealth {
    unhealthy_for: Duration,
    unhealthy_until: HashMap<String, Instant>,
}

impl ProviderHealth {
    #[must_use]
    pub fn new(unhealthy_for: Duration) -> Self {
        Self {
            unhealthy_for,
            unhealthy_until: HashMap::new(),
        }
    }

    pub fn mark_unhealthy(&mut self, provider: &str) {
        self.mark_unhealthy_at(provider, Instant::now());
    }

    fn mark_unhealthy_at(&mut self, provider: &str, now: Instant) {
        self.unhealthy_until
            .insert(provider.to_string(), now + self.unhealthy_for);
    }

    #[must_use]
    pub fn is_healthy(&self, provider: &str) -> bool {
        self.is_healthy_at(provider, Instant::now())
    }

    fn is_healthy_at(&self, provider: &str, now: Instant) -> bool {
        self.unhealthy_until
            .get(provider)
            .is_none_or(|until| now >= *until)
    }
}

pub struct MultiProviderConfig {
    /// How long a failed provider is skipped before being retried.
    pub unhealthy_secs: u64,
    /// Sliding-window rate limit across all providers.
    pub max_calls: usize,
    pub window_secs: u64,
}

impl Default for MultiProviderConfig {
    fn default() -> Self {
        Self {
            unhealthy_secs: 300,
            max_calls: 50,
            window_secs: 60,
        }
    }
}

/// Tries providers in priority order and returns the first plan produced.
/// A provider error marks it unhealthy and moves on; `None` means every
/// provider was skipped or failed, and the caller should use templates.
pub struct MultiProviderPlanner {
    providers: Vec<Box<dyn MealPlanProvider>>,
    health: ProviderHealth,
    limiter: SlidingWindowLimiter,
}

impl MultiProviderPlanner {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn MealPlanProvider>>, config: &MultiProviderConfig) -> Self {
        Self {
            providers,
            health: ProviderHealth::new(Duration::from_secs(config.unhealthy_secs)),
            limiter: SlidingWindowLimiter::new(
                config.max_calls,
                Duration::from_secs(config.window_secs),
            ),
        }
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn generate(
        &mut self,
        request: &MealPlanRequest,
        inventory: &[InventoryItem],
    ) -> Option<MealPlan> {
        for provider in &self.providers {
            let name = provider.name();
            if !self.health.is_healthy(name) {
                eprintln!("Skipping {name}: marked unhealthy after a recent failure");
                continue;
            }
            if !self.limiter.try_acquire() {
                eprintln!("Skipping {name}: rate limit reached");
                continue;
            }
            match provider.generate_plan(request, inventory) {
                Ok(plan) if !plan.is_empty() => return Some(plan),
                Ok(_) => {
                    eprintln!("{name} returned an empty plan, trying next provider");
                    self.health.mark_unhealthy(name);
                }
                Err(e) => {
                    eprintln!("{name} failed: {e:#}");
                    self.health.mark_unhealthy(name);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlannedMeal;
    use anyhow::bail;

    struct StaticProvider {
        name: &'static str,
        fail: bool,
    }

    impl StaticProvider {
        const fn ok(name: &'static str) -> Self {
            Self { name, fail: false }
        }

        const fn failing(name: &'static str) -> Self {
            Self { name, fail: true }
        }
    }

    impl MealPlanProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn generate_plan(
            &self,
            request: &MealPlanRequest,
            _inventory: &[InventoryItem],
        ) -> anyhow::Result<MealPlan> {
            if self.fail {
                bail!("simulated outage");
            }
            Ok(request
                .meal_types
                .iter()
                .map(|mt| {
                    (
                        mt.clone(),
                        PlannedMeal {
                            name: format!("{} special", self.name),
                            ingredients: vec![],
                            recipe: String::new(),
                            nutrition: None,
                        },
                    )
                })
                .collect())
        }
    }

    fn request() -> MealPlanRequest {
        MealPlanRequest {
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            meal_types: vec!["dinner".to_string()],
            dietary_restrictions: vec![],
        }
    }

    #[test]
    fn test_first_healthy_provider_wins() {
        let mut planner = MultiProviderPlanner::new(
            vec![
                Box::new(StaticProvider::ok("alpha")),
                Box::new(StaticProvider::ok("beta")),
            ],
            &MultiProviderConfig::default(),
        );
        let plan = planner.generate(&request(), &[]).unwrap();
        assert_eq!(plan["dinner"].name, "alpha special");
    }

    #[test]
    fn test_failure_falls_through_to_next() {
        let mut planner = MultiProviderPlanner::new(
            vec![
                Box::new(StaticProvider::failing("alpha")),
                Box::new(StaticProvider::ok("beta")),
            ],
            &MultiProviderConfig::default(),
        );
        let plan = planner.generate(&request(), &[]).unwrap();
        assert_eq!(plan["dinner"].name, "beta special");
    }

    #[test]
    fn test_all_failing_returns_none() {
        let mut planner = MultiProviderPlanner::new(
            vec![
                Box::new(StaticProvider::failing("alpha")),
                Box::new(StaticProvider::failing("beta")),
            ],
            &MultiProviderConfig::default(),
        );
        assert!(planner.generate(&request(), &[]).is_none());
    }

    #[test]
    fn test_unhealthy_provider_not_called_again() {
        let alpha = Box::new(StaticProvider::failing("alpha"));
        let mut planner = MultiProviderPlanner::new(
            vec![alpha, Box::new(StaticProvider::ok("beta"))],
            &MultiProviderConfig::default(),
        );
        planner.generate(&request(), &[]).unwrap();
        planner.generate(&request(), &[]).unwrap();
        assert!(!planner.health.is_healthy("alpha"));
    }

    #[test]
    fn test_rate_limit_exhaustion_skips_calls() {
        let config = MultiProviderConfig {
            max_calls: 1,
            ..Default::default()
        };
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(StaticProvider::ok("alpha"))],
            &config,
        );
        assert!(planner.generate(&request(), &[]).is_some());
        // Window not elapsed, limit already spent
        assert!(planner.generate(&request(), &[]).is_none());
    }

    #[test]
    fn test_limiter_window_slides() {
        let mut limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.try_acquire_at(t0));
        assert!(limiter.try_acquire_at(t0 + Duration::from_secs(1)));
        assert!(!limiter.try_acquire_at(t0 + Duration::from_secs(2)));
        // First call ages out of the window
        assert!(limiter.try_acquire_at(t0 + Duration::from_secs(61)));
    }

    #[test]
    fn test_health_expires() {
        let mut health = ProviderHealth::new(Duration::from_secs(300));
        let t0 = Instant::now();
        health.mark_unhealthy_at("alpha", t0);
        assert!(!health.is_healthy_at("alpha", t0 + Duration::from_secs(299)));
        assert!(health.is_healthy_at("alpha", t0 + Duration::from_secs(300)));
        assert!(health.is_healthy_at("beta", t0));
    }
}
