//! Cart conflict resolution command.

use clap::ValueEnum;

use shophub_storefront::AppError;
use shophub_storefront::services::merge::MergeResolution;

use super::{Context, print_pending_merge};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MergeChoice {
    /// Merge both carts
    Both,
    /// Keep my saved cart
    Saved,
    /// Use the previous session cart
    Anonymous,
    /// Decide later
    Later,
}

#[allow(clippy::print_stdout)]
pub fn run(ctx: &mut Context, choice: Option<MergeChoice>) -> Result<(), AppError> {
    let resolution = match choice {
        None => {
            if ctx.session.pending_merge().is_none() {
                println!("Nothing to merge.");
            } else {
                print_pending_merge(&ctx.session);
            }
            return Ok(());
        }
        Some(MergeChoice::Later) => {
            ctx.session.dismiss_merge();
            println!("OK, we'll ask again next time you sign in.");
            return Ok(());
        }
        Some(MergeChoice::Both) => MergeResolution::MergeBoth,
        Some(MergeChoice::Saved) => MergeResolution::KeepSaved,
        Some(MergeChoice::Anonymous) => MergeResolution::UseAnonymous,
    };

    ctx.session.resolve_merge(resolution)?;
    let state = ctx.session.cart().state();
    println!(
        "Done: {resolution}. Your cart now has {} items ({}).",
        state.item_count(),
        state.total_price()
    );
    Ok(())
}
