//! The kitchen pipeline: the reference topology this crate ships.
//!
//! A sequential order flow (load -> queue -> balance -> check -> notify ->
//! deliver), a parallel background enrichment group whose flaky units are
//! wrapped in validation-gated loops, and a final report leaf. The
//! composition is fixed and explicit; no unit decides at runtime whether the
//! groups run.

use crate::runner::Pipeline;
use crate::stage::{
    feedback_validator, inventory_validator, loyalty_validator, refinement_validator, Stage,
};
use crate::tools::{
    FeedbackLog, InventoryStore, LoyaltyStore, MenuTool, OrderStore, RecipeBook,
    SalesForecastTool, SystemLog, ToolRegistry,
};
use crate::work::WorkUnit;
use std::path::Path;
use std::sync::Arc;

/// The state key the final report is written to.
pub const KITCHEN_OUTPUT_KEY: &str = "kitchen_agent_output";

/// Builds the kitchen pipeline.
#[must_use]
pub fn kitchen_pipeline() -> Pipeline {
    Pipeline::new(
        "kitchen_agent",
        Stage::sequential(
            "kitchen_agent",
            vec![order_flow(), background_enrichment(), kitchen_report()],
        ),
        KITCHEN_OUTPUT_KEY,
    )
}

/// Builds a registry with every kitchen tool, backed by JSON files under the
/// given data directory.
#[must_use]
pub fn kitchen_tools(data_dir: &Path) -> Arc<ToolRegistry> {
    let registry = Arc::new(ToolRegistry::new());

    let orders = Arc::new(OrderStore::new(data_dir.join("orders.json")));
    let inventory = Arc::new(InventoryStore::new(data_dir.join("inventory.json")));
    let loyalty = Arc::new(LoyaltyStore::new(data_dir.join("loyalty.json")));
    let feedback = Arc::new(FeedbackLog::new(data_dir.join("feedback.json")));

    for tool in orders
        .tools()
        .into_iter()
        .chain(inventory.tools())
        .chain(loyalty.tools())
        .chain(feedback.tools())
    {
        registry.register(tool);
    }
    registry.register(Arc::new(SalesForecastTool::new(
        data_dir.join("sales_history.json"),
    )));
    registry.register(Arc::new(MenuTool::new(data_dir.join("menu.json"))));
    registry.register(Arc::new(RecipeBook::new(
        data_dir.join("recipes.json"),
        orders,
    )));
    registry.register(Arc::new(SystemLog::new(data_dir.join("system_logs.txt"))));

    registry
}

/// The sequential order flow.
fn order_flow() -> Stage {
    Stage::sequential(
        "order_flow",
        vec![
            Stage::leaf(
                WorkUnit::new("order_loader_agent", "order")
                    .with_instruction(
                        "Load the full order referenced by the user message into shared \
                         state so later stages never ask for details again.",
                    )
                    .with_tools(["get_menu", "get_order_details", "save_new_order"]),
            ),
            Stage::leaf(WorkUnit::new("queuing_agent", "queue_assignment").with_instruction(
                "Assign the order a queue position and priority based on size and arrival.",
            )),
            Stage::leaf(
                WorkUnit::new("kitchen_load_balancer_agent", "station_split").with_instruction(
                    "Split the order's items across kitchen stations to balance load.",
                ),
            ),
            Stage::leaf(WorkUnit::new("ai_checker_agent", "assembly_check").with_instruction(
                "Check the assembled order against its items; status PASS, HOLD, or FAIL.",
            )),
            Stage::leaf(WorkUnit::new("notifier_agent", "chef_alert").with_instruction(
                "Produce the chef alert summarizing what to cook and where.",
            )),
            Stage::leaf(
                WorkUnit::new("delivery_agent", "delivery_assignment")
                    .with_instruction(
                        "Assign the prepared order to a delivery channel and move its \
                         status forward.",
                    )
                    .with_tools(["update_order_status"]),
            ),
        ],
    )
}

/// The parallel enrichment group. Each flaky unit sits in a loop gated by its
/// validator; the forecaster is deterministic enough to run bare.
fn background_enrichment() -> Stage {
    Stage::parallel(
        "background_enrichment",
        vec![
            Stage::leaf(
                WorkUnit::new("forecasting_agent", "forecast_output")
                    .with_instruction("Forecast demand for the coming week from sales history.")
                    .with_tools(["run_sales_forecast"]),
            ),
            Stage::retry_until_valid(
                "robust_storekeeper_agent",
                Stage::leaf(
                    WorkUnit::new("storekeeper_agent", "updated_inventory")
                        .with_instruction(
                            "Deduct the order's ingredients from stock and flag anything \
                             running low. Output the updated counts as a JSON map.",
                        )
                        .with_tools([
                            "get_ingredient_requirements",
                            "fetch_inventory",
                            "update_inventory_changes",
                            "trigger_low_stock_alert",
                        ]),
                ),
                Arc::new(inventory_validator()),
            ),
            Stage::retry_until_valid(
                "robust_loyalty_agent",
                Stage::leaf(
                    WorkUnit::new("loyalty_agent", "loyalty_update")
                        .with_instruction(
                            "Award loyalty points for the order. Output JSON with user_id, \
                             updated_points, and status.",
                        )
                        .with_tools(["fetch_loyalty_profile", "update_loyalty_points"]),
                ),
                Arc::new(loyalty_validator()),
            ),
            Stage::retry_until_valid(
                "robust_feedback_agent",
                Stage::leaf(
                    WorkUnit::new("feedback_agent", "feedback_analysis")
                        .with_instruction(
                            "Record and score any customer feedback attached to the order. \
                             Output JSON with user_id and text.",
                        )
                        .with_tools([
                            "save_feedback",
                            "load_feedback_history",
                            "analyze_feedback_sentiment",
                        ]),
                ),
                Arc::new(feedback_validator()),
            ),
            Stage::retry_until_valid(
                "robust_refinement_agent",
                Stage::leaf(
                    WorkUnit::new("refinement_agent", "refinement_suggestions")
                        .with_instruction(
                            "Suggest menu or process refinements from the loyalty and \
                             feedback data. Output JSON with a suggestions list.",
                        ),
                ),
                Arc::new(refinement_validator()),
            ),
        ],
    )
}

/// The closing report leaf.
fn kitchen_report() -> Stage {
    Stage::leaf(
        WorkUnit::new("kitchen_report_agent", KITCHEN_OUTPUT_KEY)
            .with_instruction(
                "Combine the order flow results and enrichment outputs into the final \
                 kitchen report.",
            )
            .with_tools([
                "get_order_details",
                "update_order_status",
                "fetch_inventory",
                "save_system_logs",
            ]),
    )
}
