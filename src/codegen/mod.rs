//! C++ code generation
//!
//! Walks a parsed [`Program`] once, top down, and produces a single C++
//! translation unit:
//!
//! 1. The `#include <iostream>` preamble
//! 2. File-scope `int` variables for every global declaration
//! 3. A prototype for every procedure, then every procedure definition
//! 4. `int main()` holding the remaining top-level statements in source order
//!
//! Every binary operation is fully parenthesized, so the strictly
//! left-to-right grouping built by the parser survives C++ precedence rules.
//!
//! The generator never looks at the symbol table. Everything it needs about a
//! binding (global, fresh local, or store into an existing one) was recorded
//! on the declaration node while parsing.
//!
//! A shadowing declaration whose initializer reads the outer binding of the
//! same name (`declare x <- x + 1;`) is routed through a temporary, because a
//! C++ variable is already in scope inside its own initializer.

use crate::parser::ast::*;
use log::{debug, warn};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

const PREAMBLE: &str = "#include <iostream>\n\n";
const INDENT_WIDTH: usize = 4;

/// Tree-walking emitter.
///
/// The indentation depth is the only state that changes during the walk.
/// `names` is filled once per run and only read afterwards.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    indent: usize,
    names: FxHashSet<String>,
}

/// Translate `program` with a fresh generator.
pub fn generate(program: &Program) -> String {
    CodeGenerator::new().generate(program)
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the full translation unit for `program`.
    pub fn generate(&mut self, program: &Program) -> String {
        self.indent = 0;
        self.names.clear();
        for node in &program.nodes {
            collect_names(node, &mut self.names);
        }
        let mut out = String::from(PREAMBLE);

        let globals = global_names(program);
        if !globals.is_empty() {
            for name in &globals {
                out.push_str(&format!("int {} = 0;\n", name));
            }
            out.push('\n');
        }

        let procedures: Vec<&AstNode> = program
            .nodes
            .iter()
            .filter(|node| matches!(node, AstNode::Procedure { .. }))
            .collect();

        if !procedures.is_empty() {
            for procedure in &procedures {
                if let AstNode::Procedure { name, params, .. } = procedure {
                    out.push_str(&format!("{};\n", signature(name, params)));
                }
            }
            out.push('\n');

            for procedure in &procedures {
                self.emit_statement(procedure, &mut out);
                out.push('\n');
            }
        }

        out.push_str("int main() {\n");
        self.indent += 1;
        for node in &program.nodes {
            if !matches!(node, AstNode::Procedure { .. }) {
                self.emit_statement(node, &mut out);
            }
        }
        self.line(&mut out, "return 0;");
        self.indent -= 1;
        out.push_str("}\n");

        debug!(
            "generated {} bytes of C++ ({} globals, {} procedures)",
            out.len(),
            globals.len(),
            procedures.len()
        );
        out
    }

    /// Write one indented line
    fn line(&self, out: &mut String, text: &str) {
        for _ in 0..self.indent * INDENT_WIDTH {
            out.push(' ');
        }
        out.push_str(text);
        out.push('\n');
    }

    /// Emit a block's statements one level deeper than the current line
    fn emit_block(&mut self, block: &Block, out: &mut String) {
        self.indent += 1;
        for statement in &block.statements {
            self.emit_statement(statement, out);
        }
        self.indent -= 1;
    }

    fn emit_statement(&mut self, node: &AstNode, out: &mut String) {
        match node {
            AstNode::Declaration {
                name,
                init,
                storage,
                ..
            } => {
                let value = init
                    .as_deref()
                    .map(|expr| self.expression(expr))
                    .unwrap_or_else(|| "0".to_string());
                let text = match storage {
                    Storage::Local
                        if init.as_deref().is_some_and(|expr| refers_to(expr, name)) =>
                    {
                        let outer = self.unused_name(&format!("{}_outer", name));
                        self.line(out, &format!("int {} = {};", outer, value));
                        format!("int {} = {};", name, outer)
                    }
                    Storage::Local => format!("int {} = {};", name, value),
                    Storage::Global | Storage::Rebind => format!("{} = {};", name, value),
                };
                self.line(out, &text);
            }

            AstNode::Assignment { name, value, .. } => {
                let text = format!("{} = {};", name, self.expression(value));
                self.line(out, &text);
            }

            AstNode::If {
                condition,
                then_branch,
                elseif_clauses,
                else_clause,
                ..
            } => {
                let header = format!("if {} {{", self.condition(condition));
                self.line(out, &header);
                self.emit_block(then_branch, out);

                for clause in elseif_clauses {
                    let header = format!("}} else if {} {{", self.condition(&clause.condition));
                    self.line(out, &header);
                    self.emit_block(&clause.body, out);
                }

                if let Some(clause) = else_clause {
                    self.line(out, "} else {");
                    self.emit_block(&clause.body, out);
                }
                self.line(out, "}");
            }

            AstNode::While {
                condition, body, ..
            } => {
                let header = format!("while {} {{", self.condition(condition));
                self.line(out, &header);
                self.emit_block(body, out);
                self.line(out, "}");
            }

            AstNode::Block(block) => {
                self.line(out, "{");
                self.emit_block(block, out);
                self.line(out, "}");
            }

            AstNode::Put { expr, .. } => {
                let text = format!("std::cout << {} << std::endl;", self.expression(expr));
                self.line(out, &text);
            }

            AstNode::Procedure {
                name, params, body, ..
            } => {
                let header = format!("{} {{", signature(name, params));
                self.line(out, &header);
                self.emit_block(body, out);

                // Falling off the end of an int function is undefined behaviour
                if !matches!(body.statements.last(), Some(AstNode::Return { .. })) {
                    self.indent += 1;
                    self.line(out, "return 0;");
                    self.indent -= 1;
                }
                self.line(out, "}");
            }

            AstNode::CallStatement { call, .. } => {
                let text = format!("{};", self.expression(call));
                self.line(out, &text);
            }

            AstNode::Return { expr, .. } => {
                let text = format!("return {};", self.expression(expr));
                self.line(out, &text);
            }

            AstNode::Number(..)
            | AstNode::StringLiteral(..)
            | AstNode::Identifier(..)
            | AstNode::BinaryOp { .. }
            | AstNode::ProcedureCall { .. }
            | AstNode::Unknown(..) => {
                let text = format!("{};", self.expression(node));
                self.line(out, &text);
            }
        }
    }

    /// Translate an expression without a trailing `;`
    fn expression(&self, node: &AstNode) -> String {
        match node {
            AstNode::Number(digits, _) => number_literal(digits),
            AstNode::StringLiteral(text, _) => quote(text),
            AstNode::Identifier(name, _) => name.clone(),
            AstNode::BinaryOp {
                op, left, right, ..
            } => format!(
                "({} {} {})",
                self.expression(left),
                op.target_symbol(),
                self.expression(right)
            ),
            AstNode::ProcedureCall { name, args, .. } => {
                let args: Vec<String> = args.iter().map(|arg| self.expression(arg)).collect();
                format!("{}({})", name, args.join(", "))
            }
            AstNode::Unknown(..) => "0".to_string(),
            other => {
                warn!(
                    "statement node in expression position at {}",
                    other.location()
                );
                "0".to_string()
            }
        }
    }

    /// `base`, or `base` with a numeric suffix, avoiding every source name
    fn unused_name(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.names.contains(&candidate) {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        candidate
    }

    /// Parenthesized condition for `if`/`while` headers
    fn condition(&self, node: &AstNode) -> String {
        let expr = self.expression(node);
        if matches!(node, AstNode::BinaryOp { .. }) {
            expr
        } else {
            format!("({})", expr)
        }
    }
}

/// Names of every global-scope declaration, deduplicated and sorted
fn global_names(program: &Program) -> BTreeSet<&str> {
    program
        .nodes
        .iter()
        .filter_map(|node| match node {
            AstNode::Declaration {
                name,
                storage: Storage::Global,
                ..
            } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

/// True when `expr` reads the variable `name`
fn refers_to(expr: &AstNode, name: &str) -> bool {
    match expr {
        AstNode::Identifier(ident, _) => ident == name,
        AstNode::BinaryOp { left, right, .. } => refers_to(left, name) || refers_to(right, name),
        AstNode::ProcedureCall { args, .. } => args.iter().any(|arg| refers_to(arg, name)),
        _ => false,
    }
}

/// Every identifier spelled anywhere under `node`
fn collect_names(node: &AstNode, names: &mut FxHashSet<String>) {
    match node {
        AstNode::Declaration { name, init, .. } => {
            names.insert(name.clone());
            if let Some(init) = init {
                collect_names(init, names);
            }
        }
        AstNode::Assignment { name, value, .. } => {
            names.insert(name.clone());
            collect_names(value, names);
        }
        AstNode::If {
            condition,
            then_branch,
            elseif_clauses,
            else_clause,
            ..
        } => {
            collect_names(condition, names);
            collect_block(then_branch, names);
            for clause in elseif_clauses {
                collect_names(&clause.condition, names);
                collect_block(&clause.body, names);
            }
            if let Some(clause) = else_clause {
                collect_block(&clause.body, names);
            }
        }
        AstNode::While {
            condition, body, ..
        } => {
            collect_names(condition, names);
            collect_block(body, names);
        }
        AstNode::Block(block) => collect_block(block, names),
        AstNode::Put { expr, .. } | AstNode::Return { expr, .. } => collect_names(expr, names),
        AstNode::Procedure {
            name, params, body, ..
        } => {
            names.insert(name.clone());
            names.extend(params.iter().map(|p| p.name.clone()));
            collect_block(body, names);
        }
        AstNode::CallStatement { call, .. } => collect_names(call, names),
        AstNode::Identifier(name, _) => {
            names.insert(name.clone());
        }
        AstNode::BinaryOp { left, right, .. } => {
            collect_names(left, names);
            collect_names(right, names);
        }
        AstNode::ProcedureCall { name, args, .. } => {
            names.insert(name.clone());
            for arg in args {
                collect_names(arg, names);
            }
        }
        AstNode::Number(..) | AstNode::StringLiteral(..) | AstNode::Unknown(..) => {}
    }
}

fn collect_block(block: &Block, names: &mut FxHashSet<String>) {
    for statement in &block.statements {
        collect_names(statement, names);
    }
}

fn signature(name: &str, params: &[Param]) -> String {
    let params: Vec<String> = params.iter().map(|p| format!("int {}", p.name)).collect();
    format!("int {}({})", name, params.join(", "))
}

/// Strip leading zeros so C++ does not read the literal as octal
fn number_literal(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn translate(source: &str) -> String {
        let mut parser = Parser::from_source(source).unwrap();
        let program = parser.parse_program();
        generate(&program)
    }

    #[test]
    fn test_three_statement_program() {
        let output = translate("declare total <- 0;\ntotal <- total + 5;\nput(total);\n");

        assert_eq!(
            output,
            "#include <iostream>\n\
             \n\
             int total = 0;\n\
             \n\
             int main() {\n    \
             total = 0;\n    \
             total = (total + 5);\n    \
             std::cout << total << std::endl;\n    \
             return 0;\n\
             }\n"
        );
    }

    #[test]
    fn test_empty_program_still_has_main() {
        assert_eq!(
            translate(""),
            "#include <iostream>\n\nint main() {\n    return 0;\n}\n"
        );
    }

    #[test]
    fn test_left_associative_grouping_is_parenthesized() {
        let output = translate("declare a; declare b; declare c; put(a - b + c);");
        assert!(output.contains("std::cout << ((a - b) + c) << std::endl;"));
    }

    #[test]
    fn test_no_precedence_in_output() {
        let output = translate("put(1 + 2 * 3);");
        assert!(output.contains("((1 + 2) * 3)"));
    }

    #[test]
    fn test_shadowing_emits_distinct_binding() {
        let output = translate(
            "declare x <- 1; if (1 = 1) then declare x <- 2; put(x); end if; put(x);",
        );

        assert!(output.contains("int x = 0;\n"));
        assert!(output.contains("    x = 1;\n"));
        assert!(output.contains("    if (1 == 1) {\n        int x = 2;\n        std::cout << x << std::endl;\n    }\n"));
        assert!(output.ends_with("    }\n    std::cout << x << std::endl;\n    return 0;\n}\n"));
    }

    #[test]
    fn test_same_scope_redeclaration_is_a_store() {
        let output = translate("while 1 loop declare i <- 1; declare i <- 2; end loop;");

        assert!(output.contains("        int i = 1;\n        i = 2;\n"));
    }

    #[test]
    fn test_declaration_without_initializer_is_zero() {
        let output = translate("{ declare n; }");
        assert!(output.contains("    {\n        int n = 0;\n    }\n"));
    }

    #[test]
    fn test_if_chain_preserves_branch_order() {
        let output = translate(
            "declare x <- 2;\n\
             if x = 1 then put(1);\n\
             elseif x = 2 then put(2);\n\
             elseif x = 3 then put(3);\n\
             else put(0);\n\
             end if;",
        );

        assert!(output.contains(
            "    if (x == 1) {\n\
             \x20       std::cout << 1 << std::endl;\n\
             \x20   } else if (x == 2) {\n\
             \x20       std::cout << 2 << std::endl;\n\
             \x20   } else if (x == 3) {\n\
             \x20       std::cout << 3 << std::endl;\n\
             \x20   } else {\n\
             \x20       std::cout << 0 << std::endl;\n\
             \x20   }\n"
        ));
    }

    #[test]
    fn test_while_loop() {
        let output = translate("declare i <- 0; while i < 3 loop i <- i + 1; end loop;");

        assert!(output.contains("    while (i < 3) {\n        i = (i + 1);\n    }\n"));
    }

    #[test]
    fn test_non_binary_condition_gets_parentheses() {
        let output = translate("while 1 loop put(1); end loop;");
        assert!(output.contains("while (1) {"));
    }

    #[test]
    fn test_procedures_get_prototypes_and_definitions() {
        let output = translate(
            "procedure add(a, b) begin return a + b; end procedure;\n\
             procedure hello() begin put(\"hi\"); end procedure;\n\
             put(add(1, 2));\n\
             hello();",
        );

        let prototypes = "int add(int a, int b);\nint hello();\n\n";
        let add = "int add(int a, int b) {\n    return (a + b);\n}\n";
        let hello = "int hello() {\n    std::cout << \"hi\" << std::endl;\n    return 0;\n}\n";
        let main = "int main() {\n    std::cout << add(1, 2) << std::endl;\n    hello();\n";

        let proto_at = output.find(prototypes).unwrap();
        let add_at = output.find(add).unwrap();
        let hello_at = output.find(hello).unwrap();
        let main_at = output.find(main).unwrap();
        assert!(proto_at < add_at && add_at < hello_at && hello_at < main_at);
    }

    #[test]
    fn test_globals_are_deduplicated() {
        let output = translate("declare b <- 1; declare a; declare b <- 2;");

        assert_eq!(output.matches("int b = 0;").count(), 1);
        assert!(output.starts_with("#include <iostream>\n\nint a = 0;\nint b = 0;\n\n"));
        assert!(output.contains("    b = 1;\n    a = 0;\n    b = 2;\n"));
    }

    #[test]
    fn test_string_literal_is_requoted() {
        let output = translate(r#"put("C:\temp");"#);
        assert!(output.contains(r#"std::cout << "C:\\temp" << std::endl;"#));
    }

    #[test]
    fn test_leading_zeros_are_stripped() {
        let output = translate("put(007); put(000);");
        assert!(output.contains("std::cout << 7 << std::endl;"));
        assert!(output.contains("std::cout << 0 << std::endl;"));
    }

    #[test]
    fn test_unknown_token_emits_zero() {
        let output = translate("put(@);");
        assert!(output.contains("std::cout << 0 << std::endl;"));
    }

    #[test]
    fn test_dropped_assignment_emits_nothing() {
        let output = translate("declare x <- 1;\ny <- 3;\nput(x);");
        assert!(!output.contains("y ="));
        assert!(output.contains("std::cout << x << std::endl;"));
    }

    #[test]
    fn test_generator_resets_indentation_between_runs() {
        let mut parser = Parser::from_source("if 1 then while 1 loop put(1); end loop; end if;").unwrap();
        let program = parser.parse_program();

        let mut generator = CodeGenerator::new();
        let first = generator.generate(&program);
        let second = generator.generate(&program);
        assert_eq!(first, second);
    }

    #[test]
    fn test_shadowing_initializer_reads_outer_binding() {
        let output = translate(
            "declare x <- 1; if 1 then declare x <- x + 1; put(x); end if; put(x);",
        );

        assert!(output.contains(
            "    if (1) {\n        int x_outer = (x + 1);\n        int x = x_outer;\n"
        ));
        assert!(!output.contains("int x = (x + 1);"));
    }

    #[test]
    fn test_shadowing_temporary_avoids_source_names() {
        let output = translate(
            "declare x_outer <- 5; declare x <- 1;\n\
             { declare x <- x + x_outer; put(x); }",
        );

        assert!(output.contains("        int x_outer1 = (x + x_outer);\n        int x = x_outer1;\n"));
    }

    #[test]
    fn test_shadowing_global_in_procedure_body() {
        let output = translate(
            "declare counter <- 3;\n\
             procedure incremented() begin declare counter <- counter + 1; return counter; end procedure;",
        );

        assert!(output.contains(
            "int incremented() {\n    int counter_outer = (counter + 1);\n    int counter = counter_outer;\n"
        ));
    }

    #[test]
    fn test_fresh_local_without_self_reference_has_no_temporary() {
        let output = translate("declare y <- 2; { declare x <- y + 1; }");

        assert!(output.contains("        int x = (y + 1);\n"));
        assert!(!output.contains("_outer"));
    }
}
