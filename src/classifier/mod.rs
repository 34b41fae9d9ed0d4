pub mod naive_bayes;
pub mod decision_tree;
pub mod linear;
pub mod quality;
pub mod engagement;
