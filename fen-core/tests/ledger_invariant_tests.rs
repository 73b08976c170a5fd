//! Conservation property of the paper ledger.
//!
//! Over any sequence of round-trip market orders,
//! `cash + position_volume * avg_price` stays equal to
//! `initial_cash + realized_pnl_from_closes` up to Decimal division
//! rounding.

use fen_core::core::{Action, Direction, OrderType};
use fen_core::data::OrderRequest;
use fen_core::event::EventBus;
use fen_core::gateway::{Gateway, PaperGateway};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Buy { price: u32, volume: u32 },
    Sell { price: u32, volume: u32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..500, 1u32..20).prop_map(|(price, volume)| Op::Buy { price, volume }),
        (1u32..500, 1u32..30).prop_map(|(price, volume)| Op::Sell { price, volume }),
    ]
}

fn market_request(direction: Direction, price: u32, volume: u32) -> OrderRequest {
    OrderRequest {
        symbol: "BTC".to_string(),
        direction,
        action: match direction {
            Direction::Long => Action::Open,
            Direction::Short => Action::Close,
        },
        order_type: OrderType::Market,
        volume: Decimal::from(volume),
        price: Decimal::from(price),
        reference: "prop".to_string(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_conserves_value_over_round_trips(ops in prop::collection::vec(op_strategy(), 1..40)) {
        // Market orders fill synchronously inside send_order (no price
        // event has been published, so the request price is used); the
        // bus never needs to run.
        let bus = Arc::new(EventBus::new());
        let gateway = PaperGateway::new(bus);
        let initial_cash = dec!(100_000);

        let mut realized = Decimal::ZERO;

        for op in &ops {
            match *op {
                Op::Buy { price, volume } => {
                    gateway.send_order(market_request(Direction::Long, price, volume));
                }
                Op::Sell { price, volume } => {
                    // Expected realized pnl for the clamped close, taken
                    // against the average cost before the fill.
                    let held = gateway.position("BTC");
                    let avg = gateway.avg_price("BTC");
                    let actual = Decimal::from(volume).min(held);
                    if actual > Decimal::ZERO {
                        realized += (Decimal::from(price) - avg) * actual;
                    }
                    gateway.send_order(market_request(Direction::Short, price, volume));
                }
            }

            let held = gateway.position("BTC");
            prop_assert!(held >= Decimal::ZERO, "position went negative: {held}");
            prop_assert!(gateway.cash() >= Decimal::ZERO, "cash went negative");
        }

        let book_value = gateway.cash() + gateway.position("BTC") * gateway.avg_price("BTC");
        let expected = initial_cash + realized;
        let drift = (book_value - expected).abs();
        prop_assert!(
            drift < dec!(0.000001),
            "conservation violated: book={book_value} expected={expected}"
        );
    }
}
