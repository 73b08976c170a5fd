//! Adapter from external decision maps to target-position deltas.
//!
//! A decision producer (an LLM portfolio manager, an indicator pipeline, a
//! human) emits `{symbol -> {action, quantity, confidence}}`. This
//! strategy folds each decision into the symbol's target, collects the
//! freshest bars from the OMS, and hands the result to the reconciler.

use crate::template::TargetPositionCore;
use crate::Strategy;
use fen_core::data::{BarData, DecisionAction, SignalMap};
use fen_core::gateway::Setting;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

/// Strategy adapter that converts decision maps into target-position
/// changes executed through the gateway/OMS stack.
pub struct SignalStrategy {
    core: Arc<TargetPositionCore>,
    price_add: Decimal,
}

impl SignalStrategy {
    /// Default fractional slippage applied to limit prices (10 bps).
    pub const DEFAULT_PRICE_ADD: Decimal = dec!(0.001);

    /// Build from a setting map. Known keys are applied, unknown keys are
    /// silently ignored so an old configuration keeps working against a
    /// newer build.
    ///
    /// Recognized keys: `price_add` (number).
    pub fn new(core: Arc<TargetPositionCore>, setting: &Setting) -> Self {
        let mut price_add = Self::DEFAULT_PRICE_ADD;
        if let Some(value) = setting.get("price_add") {
            match value.as_f64().and_then(Decimal::from_f64) {
                Some(v) => price_add = v,
                None => tracing::warn!(?value, "ignoring non-numeric `price_add` setting"),
            }
        }
        Self { core, price_add }
    }

    pub fn core(&self) -> &Arc<TargetPositionCore> {
        &self.core
    }

    pub fn price_add(&self) -> Decimal {
        self.price_add
    }

    /// Fold each decision into the symbol's target, taking the current
    /// actual position as the base.
    fn apply_decisions(&self, signal: &SignalMap) {
        for (symbol, decision) in signal {
            let current = self.core.position(symbol);
            let target = match decision.action {
                DecisionAction::Buy => Some(current + decision.quantity),
                // Selling never asks for more than a flat book.
                DecisionAction::Sell => Some((current - decision.quantity).max(Decimal::ZERO)),
                DecisionAction::Short => Some(current - decision.quantity),
                DecisionAction::Cover => Some(current + decision.quantity),
                DecisionAction::Hold => None,
            };
            if let Some(target) = target {
                tracing::debug!(
                    strategy = self.core.name(),
                    %symbol,
                    action = ?decision.action,
                    %target,
                    "target updated"
                );
                self.core.set_target(symbol, target);
            }
        }
    }
}

impl Strategy for SignalStrategy {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn on_init(&self) {
        // Decision-driven: no warm-up needed.
    }

    fn on_signal(&self, signal: &SignalMap) {
        if signal.is_empty() {
            return;
        }

        self.apply_decisions(signal);

        // Collect the freshest bar for every symbol the producer
        // mentioned. Without at least one bar there is no price to quote
        // against, so execution waits for the next signal.
        let mut bars: HashMap<String, BarData> = HashMap::new();
        for symbol in signal.keys() {
            if let Some(bar) = self.core.oms().get_bar(symbol) {
                bars.insert(symbol.clone(), bar);
            }
        }
        if bars.is_empty() {
            tracing::debug!(
                strategy = self.core.name(),
                "no bars available yet, skipping execution"
            );
            return;
        }

        self.core.execute_trading(&bars, self.price_add);
    }
}
