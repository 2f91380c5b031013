use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sw_core::Graph;
use sw_session::strategy::plan_move;
use sw_session::{AiMove, MovePlan, Session};

use super::Context;

pub fn run(ctx: &Context) -> Result<(), String> {
    let session = super::load_session(ctx)?;
    let strategy = match ctx.strategy()? {
        Some(strategy) => strategy,
        None => session
            .active_player()
            .and_then(|p| p.strategy())
            .unwrap_or_default(),
    };
    let mut rng = match ctx.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let plan = plan_move(session.graph(), session.history(), strategy);
    let chosen = plan.choose(&mut rng);
    print!("{}", render_plan(&session, &plan, &chosen, strategy.label()));
    Ok(())
}

fn describe_move(graph: &Graph, mv: &AiMove) -> String {
    match &mv.parent {
        None => "start a new period".to_string(),
        Some(parent) => {
            let name = graph.node(parent).map_or("?", |n| n.name());
            match mv.kind {
                sw_core::NodeKind::Period => format!("add a period beside {parent} ({name})"),
                kind => format!("add {} under {parent} ({name})", kind.label().to_lowercase()),
            }
        }
    }
}

fn render_plan(session: &Session, plan: &MovePlan, chosen: &AiMove, strategy: &str) -> String {
    let mut out = format!("  {} {strategy}\n", "Strategy".bold());
    if let MovePlan::Choose(options) = plan {
        let total: f64 = options.iter().map(|o| o.weight).sum();
        for option in options {
            let share = if total > 0.0 {
                option.weight / total * 100.0
            } else {
                0.0
            };
            out.push_str(&format!(
                "    {:>5.1}%  {} under one of: {}\n",
                share,
                option.kind,
                option
                    .parents
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }
    out.push_str(&format!(
        "  {} {}\n",
        "Move".bold(),
        describe_move(session.graph(), chosen)
    ));
    out
}
