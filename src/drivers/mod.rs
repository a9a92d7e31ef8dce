pub mod graphql;
pub mod locate;
pub mod ui;

#[cfg(test)]
mod fake;
