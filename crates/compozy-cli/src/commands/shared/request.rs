use compozy_db::transition::TransitionRequest;

use crate::context::AppContext;

/// Build a transition request attributed to the acting user.
#[must_use]
pub fn transition_request(
    ctx: &AppContext,
    reason: Option<&str>,
    error: Option<&str>,
) -> TransitionRequest {
    let mut request = TransitionRequest::new();
    if let Some(actor) = ctx.actor() {
        request = request.by(actor);
    }
    if let Some(reason) = reason {
        request = request.because(reason);
    }
    if let Some(error) = error {
        request = request.with_error(error);
    }
    request
}

/// The acting user, or an error naming the operation that needs one.
pub fn require_actor<'a>(ctx: &'a AppContext, action: &str) -> anyhow::Result<&'a str> {
    ctx.actor().ok_or_else(|| {
        anyhow::anyhow!("{action} needs an acting user: pass --actor or set general.default_actor")
    })
}
