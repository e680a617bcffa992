//! Function literal analysis

use super::*;
use crate::syntax::FunctionLiteral;

impl Analyzer {
    /// Analyze a nested function literal and register it as a child of
    /// the current function. Returns its child index.
    ///
    /// `method` adds the implicit `self` parameter of `function a:m()`.
    pub(super) fn analyze_function(
        &mut self,
        func: &FunctionLiteral,
        name: Option<Rc<str>>,
        method: bool,
    ) -> Result<usize, ResolveError> {
        let name = func
            .name
            .clone()
            .or(name)
            .unwrap_or_else(|| Rc::from("anonymous"));

        // Each literal gets fresh capture and loop state; scopes of the
        // enclosing functions stay on the stack for capture resolution
        self.functions.push(FunctionState::new(name, func.vararg));
        self.push_scope();

        let mut params = Vec::with_capacity(func.params.len() + method as usize);
        if method {
            params.push(self.declare(Rc::from("self")));
        }
        for param in &func.params {
            params.push(self.declare(param.clone()));
        }
        self.current().params = params;

        let body = self.analyze_stmts(&func.body.stmts);
        self.pop_scope();
        let state = self.pop_function();
        let draft = state.into_draft(body?);

        let parent = self.current();
        parent.children.push(draft);
        Ok(parent.children.len() - 1)
    }
}
