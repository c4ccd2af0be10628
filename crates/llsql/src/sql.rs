//! The grammar of the supported SQL subset.
//!
//! The grammar is written the natural way, with left-recursive conditions and
//! alternatives sharing prefixes; normalization turns it into LL(1) form.

use crate::grammar::{n, t, Grammar, GrammarError};
use llsql_runtime::TokenKind::*;

pub fn grammar() -> Result<Grammar, GrammarError> {
    Grammar::define(|g| {
        g.rule("stmt_list", [n("stmt"), t(Semicolon), n("stmt_list")])?;
        g.rule("stmt_list", [])?;

        g.rule("stmt", [])?;
        g.rule("stmt", [n("select_stmt")])?;
        g.rule("stmt", [n("insert_stmt")])?;
        g.rule("stmt", [n("create_table_stmt")])?;

        // SELECT
        g.rule(
            "select_stmt",
            [t(Select), n("identifier_list"), n("from_stmt"), n("where_stmt")],
        )?;
        g.rule(
            "select_stmt",
            [t(Select), t(Star), n("from_stmt"), n("where_stmt")],
        )?;
        g.rule("from_stmt", [])?;
        g.rule("from_stmt", [t(From), n("identifier_list")])?;
        g.rule("where_stmt", [])?;
        g.rule("where_stmt", [t(Where), n("condition_expr")])?;

        // INSERT
        g.rule(
            "insert_stmt",
            [
                t(Insert),
                t(Into),
                t(Identifier),
                t(Values),
                t(ParenOpen),
                n("constant_list"),
                t(ParenClose),
            ],
        )?;
        g.rule(
            "insert_stmt",
            [
                t(Insert),
                t(Into),
                t(Identifier),
                t(ParenOpen),
                n("identifier_list"),
                t(ParenClose),
                t(Values),
                t(ParenOpen),
                n("constant_list"),
                t(ParenClose),
            ],
        )?;

        // CREATE TABLE
        g.rule(
            "create_table_stmt",
            [
                t(Create),
                t(Table),
                t(Identifier),
                t(ParenOpen),
                n("decl_list"),
                t(ParenClose),
            ],
        )?;

        // conditions: OR binds weaker than AND.
        g.rule(
            "condition_expr",
            [n("condition_expr"), t(Or), n("condition_term")],
        )?;
        g.rule("condition_expr", [n("condition_term")])?;
        g.rule(
            "condition_term",
            [n("condition_term"), t(And), n("condition_op")],
        )?;
        g.rule("condition_term", [n("condition_op")])?;
        g.rule(
            "condition_op",
            [t(Not), t(ParenOpen), n("condition_expr"), t(ParenClose)],
        )?;
        g.rule(
            "condition_op",
            [t(ParenOpen), n("condition_expr"), t(ParenClose)],
        )?;
        for op in [Less, Greater, Equal] {
            g.rule(
                "condition_op",
                [
                    n("identifier_or_constant"),
                    t(op),
                    n("identifier_or_constant"),
                ],
            )?;
        }
        g.rule(
            "condition_op",
            [
                n("identifier_or_constant"),
                t(Between),
                n("identifier_or_constant"),
                t(And),
                n("identifier_or_constant"),
            ],
        )?;
        g.rule(
            "condition_op",
            [n("identifier_or_constant"), t(Like), t(CharConstant)],
        )?;
        g.rule(
            "condition_op",
            [
                n("identifier_or_constant"),
                t(In),
                t(ParenOpen),
                n("constant_list"),
                t(ParenClose),
            ],
        )?;

        // column declarations
        g.rule("decl_list", [])?;
        g.rule("decl_list", [n("var_decl")])?;
        g.rule(
            "decl_list",
            [n("var_decl"), t(Comma), n("primary_key_decl")],
        )?;
        g.rule("decl_list", [n("var_decl"), t(Comma), n("decl_list")])?;
        for ty in [Int, Char, Number] {
            g.rule("var_decl", [t(Identifier), t(ty)])?;
            g.rule(
                "var_decl",
                [
                    t(Identifier),
                    t(ty),
                    t(ParenOpen),
                    t(IntConstant),
                    t(ParenClose),
                ],
            )?;
        }
        g.rule(
            "var_decl",
            [
                t(Identifier),
                t(Number),
                t(ParenOpen),
                t(IntConstant),
                t(Comma),
                t(IntConstant),
                t(ParenClose),
            ],
        )?;
        g.rule(
            "primary_key_decl",
            [
                t(Primary),
                t(Key),
                t(ParenOpen),
                n("identifier_list"),
                t(ParenClose),
            ],
        )?;

        // lists
        g.rule(
            "identifier_list",
            [t(Identifier), t(Comma), n("identifier_list")],
        )?;
        g.rule("identifier_list", [t(Identifier)])?;
        g.rule("constant_list", [])?;
        g.rule(
            "constant_list",
            [n("constant"), t(Comma), n("constant_list")],
        )?;
        g.rule("constant_list", [n("constant")])?;

        g.rule("identifier_or_constant", [t(Identifier)])?;
        g.rule("identifier_or_constant", [n("constant")])?;
        g.rule("constant", [t(IntConstant)])?;
        g.rule("constant", [t(CharConstant)])?;
        g.rule("constant", [t(NumberConstant)])?;

        Ok(())
    })
}
