use std::time::Instant;

use rust_decimal::Decimal;

use crate::commands::CommandResult;
use haggle_core::config::{AppConfig, LoadOptions};
use haggle_core::disclosure::SharedContactDetails;
use haggle_core::domain::category::Category;
use haggle_core::domain::offer::{OfferDraft, OfferStatus, QuotedItem};
use haggle_core::domain::party::{Actor, UserId, VendorId};
use haggle_core::domain::request::{RequestDraft, RequestItem, RequestItemId, RequestStatus};
use haggle_core::negotiation::{InMemoryMarketStore, NegotiationEngine};
use haggle_db::{connect_with_settings, migrations};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms: config_started.elapsed().as_millis() as u64,
                message: error.to_string(),
            });
            checks.push(skipped("negotiation_roundtrip"));
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let roundtrip_started = Instant::now();
    match negotiation_roundtrip() {
        Ok(message) => checks.push(SmokeCheck {
            name: "negotiation_roundtrip",
            status: SmokeStatus::Pass,
            elapsed_ms: roundtrip_started.elapsed().as_millis() as u64,
            message,
        }),
        Err(message) => {
            checks.push(SmokeCheck {
                name: "negotiation_roundtrip",
                status: SmokeStatus::Fail,
                elapsed_ms: roundtrip_started.elapsed().as_millis() as u64,
                message,
            });
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(async {
        connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
    });

    let pool = match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });
            pool
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let migration_started = Instant::now();
    match runtime.block_on(migrations::run_pending(&pool)) {
        Ok(()) => checks.push(SmokeCheck {
            name: "migration_visibility",
            status: SmokeStatus::Pass,
            elapsed_ms: migration_started.elapsed().as_millis() as u64,
            message: "embedded migrations applied cleanly".to_string(),
        }),
        Err(error) => checks.push(SmokeCheck {
            name: "migration_visibility",
            status: SmokeStatus::Fail,
            elapsed_ms: migration_started.elapsed().as_millis() as u64,
            message: error.to_string(),
        }),
    }

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Drive one enquiry through quote, both counters, acceptance and
/// confirmation against the in-memory store. No I/O involved; a failure
/// here means the engine itself is broken.
fn negotiation_roundtrip() -> Result<String, String> {
    let mut engine = NegotiationEngine::new(InMemoryMarketStore::new());
    let buyer = UserId("smoke-buyer".to_string());
    let vendor = VendorId("smoke-vendor".to_string());

    let request = engine
        .create_request(
            &buyer,
            RequestDraft {
                title: "Smoke check enquiry".to_string(),
                items: vec![
                    RequestItem {
                        id: RequestItemId("smoke-item-1".to_string()),
                        title: "Primary part".to_string(),
                        description: String::new(),
                        quantity: 1,
                        image_url: None,
                    },
                    RequestItem {
                        id: RequestItemId("smoke-item-2".to_string()),
                        title: "Secondary part".to_string(),
                        description: String::new(),
                        quantity: 2,
                        image_url: None,
                    },
                ],
                categories: vec![Category::General],
                ..RequestDraft::default()
            },
        )
        .map_err(|error| format!("create_request failed: {error}"))?;

    let quoted = |cents_one: i64, cents_two: i64| {
        vec![
            QuotedItem {
                request_item_id: RequestItemId("smoke-item-1".to_string()),
                price: Decimal::new(cents_one, 2),
            },
            QuotedItem {
                request_item_id: RequestItemId("smoke-item-2".to_string()),
                price: Decimal::new(cents_two, 2),
            },
        ]
    };

    let offer = engine
        .create_offer(
            &vendor,
            OfferDraft {
                request_id: request.id.clone(),
                quoted_items: quoted(1_000, 500),
                notes: None,
            },
        )
        .map_err(|error| format!("create_offer failed: {error}"))?;

    engine
        .submit_counter_offer(&offer.id, quoted(900, 500), Actor::Buyer)
        .map_err(|error| format!("buyer counter failed: {error}"))?;
    engine
        .submit_counter_offer(&offer.id, quoted(800, 500), Actor::Vendor)
        .map_err(|error| format!("vendor counter failed: {error}"))?;
    engine.accept_offer(&offer.id).map_err(|error| format!("accept failed: {error}"))?;

    let outcome = engine
        .confirm_offer(
            &offer.id,
            SharedContactDetails::edited("Smoke Vendor", "smoke@example.com", "555-0000", None),
        )
        .map_err(|error| format!("confirm failed: {error}"))?;

    if outcome.request.status != RequestStatus::Completed {
        return Err(format!("request ended {:?}, expected completed", outcome.request.status));
    }
    let confirmed =
        outcome.offers.iter().filter(|offer| offer.status == OfferStatus::Confirmed).count();
    if confirmed != 1 {
        return Err(format!("expected exactly one confirmed offer, found {confirmed}"));
    }

    Ok("quote, counters, acceptance and confirmation all applied".to_string())
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped because an earlier check failed".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let all_pass = checks.iter().all(|check| check.status == SmokeStatus::Pass);
    let status = if all_pass { SmokeStatus::Pass } else { SmokeStatus::Fail };
    let summary = if all_pass {
        "smoke: all readiness checks passed".to_string()
    } else {
        "smoke: one or more readiness checks failed".to_string()
    };

    let report = SmokeReport { command: "smoke", status, summary, total_elapsed_ms, checks };
    let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"message\":\"serialization failed: {}\"}}",
            error.to_string().replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if all_pass { 0 } else { 1 }, output }
}
