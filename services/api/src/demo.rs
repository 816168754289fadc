use crate::infra::{in_memory_service, InMemoryPaymentRuleService};
use clap::Args;
use payment_rules::error::AppError;
use payment_rules::rules::{
    load_catalog, parse_catalog, CheckoutContext, EvaluationResult, OrderId, PaymentMethod, RuleId,
};
use std::path::PathBuf;

const DEMO_CATALOG: &str = r#"[
    {
        "id": "cod-advance-large-orders",
        "name": "Advance on large COD orders",
        "priority": 100,
        "paymentMethod": "COD",
        "action": "FORCE_ADVANCE",
        "conditions": { "minAmount": 500 },
        "advancePaymentSettings": { "type": "PARTIAL", "percentage": 20 }
    },
    {
        "id": "cod-no-electronics",
        "name": "No COD for electronics",
        "priority": 50,
        "paymentMethod": "COD",
        "action": "RESTRICT",
        "conditions": { "categories": ["Electronics"] }
    },
    {
        "id": "online-admins",
        "name": "Admins pay online",
        "priority": 200,
        "paymentMethod": "ONLINE",
        "action": "ALLOW",
        "conditions": { "userRoles": ["ADMIN"] }
    }
]"#;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON rule catalog to evaluate against
    #[arg(long)]
    pub(crate) rules: PathBuf,
    /// Order total for the checkout
    #[arg(long)]
    pub(crate) total: f64,
    /// Product category in the cart (repeatable)
    #[arg(long = "category")]
    pub(crate) categories: Vec<String>,
    /// Role of the signed-in customer; omit for a guest checkout
    #[arg(long)]
    pub(crate) role: Option<String>,
    /// Customer id reported alongside the role
    #[arg(long)]
    pub(crate) user_id: Option<String>,
}

impl EvaluateArgs {
    fn checkout(&self) -> CheckoutContext {
        let categories: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        let ctx = CheckoutContext::guest(self.total, &categories);
        match &self.role {
            Some(role) => ctx.with_user(self.user_id.as_deref().unwrap_or("cli-user"), role),
            None => ctx,
        }
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let service = in_memory_service();
    let seeded = service.seed(load_catalog(&args.rules)?)?;
    let ctx = args.checkout();

    println!(
        "Evaluating checkout of {:.2} against {} rule(s) from {}",
        ctx.order_total,
        seeded,
        args.rules.display()
    );
    let result = service.evaluate(&ctx)?;
    render_result(&result);
    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    let service = demo_service()?;

    println!("Payment rules demo");
    println!("Catalog (strongest first):");
    for rule in service.list()? {
        println!(
            "  - [{}] {} | priority {} | {} -> {}",
            rule.id,
            rule.name,
            rule.priority,
            rule.payment_method.label(),
            rule.action.label()
        );
    }

    for (title, ctx) in demo_scenarios() {
        println!("\n{title}");
        let result = service.evaluate(&ctx)?;
        render_result(&result);
    }

    println!("\nOrder audit trail");
    let order_id = OrderId("order-demo-0001".to_string());
    let ctx = CheckoutContext::guest(200.0, &["Electronics"]).with_user("u-1001", "USER");
    let record = service.evaluate_for_order(order_id.clone(), ctx)?;
    println!(
        "- Recorded decision for {} at {}",
        record.order_id.0,
        record.recorded_at.to_rfc3339()
    );
    for applied in record.applied_rules(PaymentMethod::Cod) {
        println!("  COD decided by [{}] {}", applied.id, applied.name);
    }

    service.set_active(&RuleId("cod-no-electronics".to_string()), false)?;
    if let Some(replayed) = service.decision_for_order(&order_id)? {
        println!(
            "- After disabling the electronics rule the stored decision still reads: {}",
            replayed.result.summary()
        );
    }

    Ok(())
}

fn demo_service() -> Result<InMemoryPaymentRuleService, AppError> {
    let service = in_memory_service();
    service.seed(parse_catalog(DEMO_CATALOG)?)?;
    Ok(service)
}

fn demo_scenarios() -> Vec<(&'static str, CheckoutContext)> {
    vec![
        (
            "Large electronics order (600.00)",
            CheckoutContext::guest(600.0, &["Electronics"]).with_user("u-1001", "USER"),
        ),
        (
            "Small fashion order (30.00)",
            CheckoutContext::guest(30.0, &["Fashion"]).with_user("u-1001", "USER"),
        ),
        (
            "Administrator checkout",
            CheckoutContext::guest(75.0, &["Books"]).with_user("a-1", "ADMIN"),
        ),
        (
            "Mid-sized electronics order (200.00)",
            CheckoutContext::guest(200.0, &["Electronics"]).with_user("u-1001", "USER"),
        ),
        (
            "Guest checkout (no account)",
            CheckoutContext::guest(120.0, &["Books"]),
        ),
    ]
}

fn render_result(result: &EvaluationResult) {
    for method in PaymentMethod::ALL {
        let Some(outcome) = result.method(method) else {
            continue;
        };
        match &outcome.advance_payment_requirement {
            Some(advance) => println!(
                "- {}: {} (advance {:.2})",
                method,
                outcome.status.label(),
                advance.amount
            ),
            None => println!("- {}: {}", method, outcome.status.label()),
        }
        for applied in &outcome.applied_rules {
            println!(
                "    matched [{}] {} (priority {}, {})",
                applied.id,
                applied.name,
                applied.priority,
                applied.action.label()
            );
        }
    }
    for anomaly in &result.anomalies {
        println!(
            "  ! skipped [{}] for {}: {}",
            anomaly.rule_id, anomaly.method, anomaly.reason
        );
    }
}
