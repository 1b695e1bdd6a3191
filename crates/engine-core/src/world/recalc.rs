//! Fixed-formula recomputation of economic and social quantities, run once
//! per tick after all action handlers, in a fixed step order.

use super::GameWorld;
use crate::kernel;

impl GameWorld {
    pub(super) fn recalculate(&mut self) {
        // 1. Price index follows demand/supply with dampening.
        let market = &self.state.economy.market;
        if market.supply > 0.0 {
            let price = 0.8 * market.price_index + 0.2 * (market.demand / market.supply);
            kernel::write(&mut self.state, "economy.market.price_index", price);
        }

        // 2. Shortage flag.
        let market = &self.state.economy.market;
        self.state.economy.market.shortage = market.demand > 1.2 * market.supply;

        // 3. Inflation from price drift and deficit monetization.
        let economy = &self.state.economy;
        let inflation = 0.7 * economy.inflation
            + 0.3 * (10.0 * (economy.market.price_index - 1.0) + economy.budget.deficit.max(0.0) * 0.01);
        kernel::write(&mut self.state, "economy.inflation", inflation);

        // 4. GDP growth, drag from inflation and unemployment.
        let economy = &self.state.economy;
        let previous_gdp = economy.gdp;
        let gdp = previous_gdp
            * (1.0 + 0.02 - 0.001 * economy.inflation - 0.001 * economy.unemployment);
        kernel::write(&mut self.state, "economy.gdp", gdp);
        let delta = self.state.economy.gdp - previous_gdp;
        kernel::write(&mut self.state, "economy.gdp_delta", delta);

        // 5. Budget: annualized revenue prorated per tick.
        let economy = &self.state.economy;
        let ticks_per_year =
            (365.0 / (f64::from(self.state.meta.tick_interval_hours) / 24.0)).round();
        let revenue =
            economy.gdp * economy.tax_rate * 0.01 * economy.tax_compliance / ticks_per_year;
        let deficit = economy.budget.spending - revenue;
        kernel::write(&mut self.state, "economy.budget.revenue", revenue);
        kernel::write(&mut self.state, "economy.budget.deficit", deficit);
        kernel::add(&mut self.state, "economy.budget.reserves", -deficit);

        // 6. Unemployment tracks growth direction.
        let step = if self.state.economy.gdp_delta > 0.0 { -0.3 } else { 0.5 };
        kernel::add(&mut self.state, "economy.unemployment", step);

        // 7. Spending effects by allocation category.
        let spending = self.state.economy.budget.spending;
        let allocation = self.state.government.budget_allocation.clone();
        kernel::add(&mut self.state, "society.satisfaction", allocation.welfare * spending * 0.001);
        kernel::add(
            &mut self.state,
            "society.radicalization",
            -(allocation.enforcement * spending * 0.0005),
        );
        kernel::add(
            &mut self.state,
            "society.public_trust",
            -(allocation.enforcement * spending * 0.0002),
        );
        kernel::add(&mut self.state, "society.stability", allocation.education * spending * 0.0001);
        kernel::add(&mut self.state, "economy.gdp", allocation.infrastructure * spending * 0.005);

        // 8. Social feedback.
        let society = &self.state.society;
        let mut stability_drop = 0.0;
        if society.satisfaction < 30.0 {
            stability_drop += (30.0 - society.satisfaction) * 0.05;
        }
        if society.radicalization > 50.0 {
            stability_drop += (society.radicalization - 50.0) * 0.03;
        }
        if stability_drop > 0.0 {
            kernel::add(&mut self.state, "society.stability", -stability_drop);
        }

        // 9. Protest pressure accumulates, then decays.
        let society = &self.state.society;
        let economy = &self.state.economy;
        let mut pressure = society.protest_pressure;
        if society.satisfaction < 40.0 {
            pressure += 0.05;
        }
        if economy.market.shortage {
            pressure += 0.10;
        }
        if economy.unemployment > 15.0 {
            pressure += 0.03;
        }
        pressure *= 0.9;
        kernel::write(&mut self.state, "society.protest_pressure", pressure);

        // 10. Market decay.
        let market = &self.state.economy.market;
        let supply = market.supply * 0.95;
        let demand = market.demand * 0.90;
        kernel::write(&mut self.state, "economy.market.supply", supply);
        kernel::write(&mut self.state, "economy.market.demand", demand);
    }
}
