//! Return checking pass
//!
//! For every function with a non-void return type, builds a control-flow
//! graph of basic blocks from the body, then solves a forward dataflow
//! fixpoint:
//!
//! ```text
//! returned_so_far(b) = returns(b)
//!     ∨ (pred(b) ≠ ∅ ∧ ∀p ∈ pred(b): returned_so_far(p))
//! ```
//!
//! over the post-order enumeration of the graph. The function is rejected
//! iff the exit block's `returned_so_far` is false. Body-less functions
//! (externs) are skipped.

use rill_ast as ast;
use rill_ast::StmtKind;

use crate::context::Sema;
use crate::error::SemaErrorKind;

/// Index of a basic block in the per-function block pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// A maximal single-entry single-exit straight-line statement run.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    /// True iff the block's statements contain a return statement.
    pub returns: bool,
    pub pred: Vec<BlockId>,
    pub succ: Vec<BlockId>,
    /// Marker for the post-order enumeration.
    pub walked: bool,
    /// Dataflow value: every control flow leading here has returned.
    pub returned_so_far: bool,
}

pub struct ReturnChecker<'a> {
    sema: &'a mut Sema,
    blocks: Vec<BasicBlock>,
}

impl<'a> ReturnChecker<'a> {
    pub fn run(sema: &'a mut Sema, file: &ast::File) {
        log::debug!("return checking");
        let mut checker = ReturnChecker {
            sema,
            blocks: Vec::new(),
        };
        for item in &file.items {
            checker.visit_item(item);
        }
    }

    fn visit_item(&mut self, item: &ast::Item) {
        match item {
            ast::Item::Func(f) | ast::Item::Extern(f) => self.visit_func_decl(f),
            ast::Item::Struct(_) | ast::Item::Enum(_) => {}
        }
    }

    fn visit_func_decl(&mut self, f: &ast::FuncDecl) {
        // Nested function declarations get their own graphs, whatever the
        // enclosing function returns.
        if let Some(body) = &f.body {
            self.visit_nested(body);
        }

        // Void functions have nothing to prove; externs have no body.
        if f.ret_type_expr.is_none() {
            return;
        }
        let body = match &f.body {
            Some(body) => body,
            None => return,
        };

        self.blocks.clear();
        let entry = self.make_block();
        let exit = self.visit_compound_stmt(body, entry);

        let mut walklist = Vec::new();
        self.enumerate_postorder(entry, &mut walklist);
        self.solve(&walklist);

        if !self.blocks[exit.0].returned_so_far {
            self.sema.error(SemaErrorKind::NotGuaranteedReturn, f.span);
        }
    }

    /// Functions declared inside a body are checked independently; their
    /// statements play no role in the enclosing function's graph, which is
    /// only built once all of them are done.
    fn visit_nested(&mut self, cs: &ast::CompoundStmt) {
        for stmt in &cs.stmts {
            match &stmt.kind {
                StmtKind::Decl(ast::Decl::Func(f)) => self.visit_func_decl(f),
                StmtKind::Compound(inner) => self.visit_nested(inner),
                StmtKind::If(if_stmt) => self.visit_nested_if(if_stmt),
                _ => {}
            }
        }
    }

    fn visit_nested_if(&mut self, if_stmt: &ast::IfStmt) {
        self.visit_nested(&if_stmt.then_body);
        if let Some(else_if) = &if_stmt.else_if {
            self.visit_nested_if(else_if);
        }
        if let Some(else_body) = &if_stmt.else_body {
            self.visit_nested(else_body);
        }
    }

    // =========================================================================
    // Graph construction
    // =========================================================================

    fn make_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::default());
        id
    }

    fn link(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.0].succ.push(to);
        self.blocks[to.0].pred.push(from);
    }

    fn visit_compound_stmt(&mut self, cs: &ast::CompoundStmt, mut bb: BlockId) -> BlockId {
        for stmt in &cs.stmts {
            bb = self.visit_stmt(stmt, bb);
        }
        bb
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt, bb: BlockId) -> BlockId {
        match &stmt.kind {
            StmtKind::If(if_stmt) => self.visit_if_stmt(if_stmt, bb),
            _ => {
                // "Plain" statements accumulate into the current block.
                if matches!(stmt.kind, StmtKind::Return { .. }) {
                    self.blocks[bb.0].returns = true;
                }
                bb
            }
        }
    }

    /// The then-branch always gets a fresh block. An else-branch gets one
    /// only if it exists; otherwise the pre-branch block itself stands in
    /// as the second predecessor of the join. An else-if is visited
    /// recursively with `bb` as its predecessor rather than a fresh block.
    fn visit_if_stmt(&mut self, if_stmt: &ast::IfStmt, bb: BlockId) -> BlockId {
        let then_start = self.make_block();
        self.link(bb, then_start);
        let then_end = self.visit_compound_stmt(&if_stmt.then_body, then_start);

        let else_end = if let Some(else_if) = &if_stmt.else_if {
            self.visit_if_stmt(else_if, bb)
        } else if let Some(else_body) = &if_stmt.else_body {
            let else_start = self.make_block();
            self.link(bb, else_start);
            self.visit_compound_stmt(else_body, else_start)
        } else {
            bb
        };

        let join = self.make_block();
        self.link(then_end, join);
        self.link(else_end, join);
        join
    }

    // =========================================================================
    // Dataflow
    // =========================================================================

    fn enumerate_postorder(&mut self, bb: BlockId, walklist: &mut Vec<BlockId>) {
        if self.blocks[bb.0].walked {
            return;
        }
        self.blocks[bb.0].walked = true;

        let succ = self.blocks[bb.0].succ.clone();
        for s in succ {
            self.enumerate_postorder(s, walklist);
        }
        walklist.push(bb);
    }

    /// Iterative solution over the reverse post-order until a fixed point.
    fn solve(&mut self, walklist: &[BlockId]) {
        for &bb in walklist {
            self.blocks[bb.0].returned_so_far = false;
        }

        let mut changed = true;
        while changed {
            changed = false;

            for &bb in walklist.iter().rev() {
                let all_preds_return = {
                    let block = &self.blocks[bb.0];
                    !block.pred.is_empty()
                        && block
                            .pred
                            .iter()
                            .all(|p| self.blocks[p.0].returned_so_far)
                };

                let value = self.blocks[bb.0].returns || all_preds_return;
                if value != self.blocks[bb.0].returned_so_far {
                    self.blocks[bb.0].returned_so_far = value;
                    changed = true;
                }
            }
        }
    }
}
