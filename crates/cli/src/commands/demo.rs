use rust_decimal::Decimal;

use crate::commands::CommandResult;
use haggle_core::disclosure::SharedContactDetails;
use haggle_core::domain::category::Category;
use haggle_core::domain::offer::{OfferDraft, OfferId, OfferStatus, QuotedItem};
use haggle_core::domain::party::{Actor, UserId, Vendor, VendorId};
use haggle_core::domain::request::{RequestDraft, RequestItem, RequestItemId};
use haggle_core::negotiation::{InMemoryMarketStore, MarketStore, NegotiationEngine};
use haggle_core::pricing::breakdown;
use haggle_core::views::leads_for_vendor;
use haggle_vision::{DisabledAnalyzer, ImageAnalyzer, ImagePayload, VisionError};

/// Walk one enquiry from captured image to confirmed deal against the
/// in-memory store, narrating every state change. Nothing touches disk.
pub fn run() -> CommandResult {
    match transcript() {
        Ok(lines) => CommandResult { exit_code: 0, output: lines.join("\n") },
        Err(error) => CommandResult::failure("demo", "negotiation", error, 1),
    }
}

fn transcript() -> Result<Vec<String>, String> {
    let mut lines = Vec::new();
    let mut engine = NegotiationEngine::new(InMemoryMarketStore::new());

    let buyer = UserId("demo-buyer".to_string());
    let vendor = Vendor {
        id: VendorId("demo-vendor".to_string()),
        business_name: "Auto Parts Pro".to_string(),
        specialties: vec![Category::AutoParts],
        email: "parts@example.com".to_string(),
        phone: Some("555-0101".to_string()),
    };
    let rival = VendorId("demo-rival".to_string());

    // the buyer snaps a photo; with no provider configured the analysis
    // degrades and the form falls back to manual entry
    lines.push("buyer: photographing the broken part for suggestions".to_string());
    let analyzer = DisabledAnalyzer;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to initialize async runtime: {error}"))?;
    match runtime.block_on(analyzer.suggest(&ImagePayload::new("image/jpeg", "ZGVtbw=="))) {
        Ok(suggestion) => {
            lines.push(format!("vision: suggested \"{}\"", suggestion.title));
        }
        Err(VisionError::Disabled) => {
            lines.push("vision: analysis disabled, continuing with manual entry".to_string());
        }
        Err(error) => {
            lines.push(format!("vision: {error}; continuing with manual entry"));
        }
    }

    let request = engine
        .create_request(
            &buyer,
            RequestDraft {
                title: "Brake overhaul for 2018 Honda Civic".to_string(),
                items: vec![
                    RequestItem {
                        id: RequestItemId("demo-caliper".to_string()),
                        title: "Front-left brake caliper".to_string(),
                        description: "OEM 45019-TBA-A00 or equivalent.".to_string(),
                        quantity: 1,
                        image_url: None,
                    },
                    RequestItem {
                        id: RequestItemId("demo-pads".to_string()),
                        title: "Brake pad set".to_string(),
                        description: "Ceramic preferred.".to_string(),
                        quantity: 2,
                        image_url: None,
                    },
                ],
                categories: vec![Category::AutoParts],
                ..RequestDraft::default()
            },
        )
        .map_err(|error| format!("create_request failed: {error}"))?;
    lines.push(format!(
        "buyer: submitted enquiry \"{}\" with {} items",
        request.title,
        request.items.len()
    ));

    let requests = engine.store().requests();
    let offers = engine.store().offers();
    let leads = leads_for_vendor(&vendor, &requests, &offers);
    lines.push(format!("vendor: sees {} matching lead(s)", leads.len()));

    let quoted = |caliper_cents: i64, pads_cents: i64| {
        vec![
            QuotedItem {
                request_item_id: RequestItemId("demo-caliper".to_string()),
                price: Decimal::new(caliper_cents, 2),
            },
            QuotedItem {
                request_item_id: RequestItemId("demo-pads".to_string()),
                price: Decimal::new(pads_cents, 2),
            },
        ]
    };

    let offer = engine
        .create_offer(
            &vendor.id,
            OfferDraft {
                request_id: request.id.clone(),
                quoted_items: quoted(9_500, 1_250),
                notes: Some("OEM parts, in stock.".to_string()),
            },
        )
        .map_err(|error| format!("create_offer failed: {error}"))?;
    lines.push(format!("vendor: quoted ${} itemized as:", offer.total_price));
    for line in breakdown(&request.items, &offer.quoted_items).lines {
        match line.unit_price {
            Some(price) => lines.push(format!(
                "    {} x{} @ ${price} = ${}",
                line.title, line.quantity, line.line_total
            )),
            None => lines.push(format!("    {} x{}: not available", line.title, line.quantity)),
        }
    }

    let rival_offer = engine
        .create_offer(
            &rival,
            OfferDraft {
                request_id: request.id.clone(),
                quoted_items: quoted(9_900, 1_100),
                notes: None,
            },
        )
        .map_err(|error| format!("rival create_offer failed: {error}"))?;
    lines.push(format!("rival vendor: quoted ${}", rival_offer.total_price));

    let countered = engine
        .submit_counter_offer(&offer.id, quoted(8_500, 1_250), Actor::Buyer)
        .map_err(|error| format!("buyer counter failed: {error}"))?;
    lines.push(format!("buyer: countered down to ${}", countered.total_price));

    let final_offer = engine
        .submit_counter_offer(&offer.id, quoted(9_000, 1_200), Actor::Vendor)
        .map_err(|error| format!("vendor counter failed: {error}"))?;
    lines.push(format!("vendor: final counter at ${}", final_offer.total_price));

    let accepted = engine
        .accept_offer(&offer.id)
        .map_err(|error| format!("accept failed: {error}"))?;
    lines.push(format!(
        "buyer: accepted the final offer, enquiry is now {}",
        accepted.request.status.as_str()
    ));

    let confirmed = engine
        .confirm_offer(&offer.id, SharedContactDetails::from_profile(&vendor))
        .map_err(|error| format!("confirm failed: {error}"))?;
    lines.push(format!(
        "vendor: confirmed the deal, enquiry is now {}",
        confirmed.request.status.as_str()
    ));

    for settled in &confirmed.offers {
        lines.push(format!("    offer {} -> {}", settled.id, settled.status.as_str()));
    }

    let winner = confirmed
        .offers
        .iter()
        .find(|candidate| candidate.status == OfferStatus::Confirmed)
        .ok_or_else(|| "no confirmed offer after confirmation".to_string())?;
    let details = winner
        .shared_contact_details
        .as_ref()
        .ok_or_else(|| "confirmed offer is missing contact details".to_string())?;
    lines.push(format!(
        "buyer: contact details disclosed once - {} <{}> {}",
        details.business_name, details.email, details.phone
    ));

    demo_assert(engine.store(), &offer.id)?;
    lines.push("demo: negotiation invariants verified".to_string());
    Ok(lines)
}

fn demo_assert(store: &InMemoryMarketStore, winner: &OfferId) -> Result<(), String> {
    let offers = store.offers();
    let confirmed: Vec<_> =
        offers.iter().filter(|offer| offer.status == OfferStatus::Confirmed).collect();
    if confirmed.len() != 1 || &confirmed[0].id != winner {
        return Err("expected exactly one confirmed offer, the accepted one".to_string());
    }
    if offers
        .iter()
        .any(|offer| offer.status != OfferStatus::Confirmed && offer.status.is_open())
    {
        return Err("confirmation left a sibling offer open".to_string());
    }
    Ok(())
}
