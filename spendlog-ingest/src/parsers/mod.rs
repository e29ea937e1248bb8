pub mod expense_line;
