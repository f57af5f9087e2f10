//! Edge-loop and curve-fitting algorithms.
//!
//! This module contains the editing engine, including:
//!
//! - **Curve math**: Hermite and Bezier evaluation, arc-length resampling
//! - **Shortest paths**: Dijkstra over the edge graph
//! - **Topology walking**: ordered loops, rings, boundaries and n-gon fans
//! - **Edge loops**: loop building, valence ranking and the loop operators
//! - **Vertex curves**: arcs and splines through picked vertices
//! - **Sessions**: revert, cache and mix for repeated application

pub mod edgeloop;
pub mod interpolate;
pub mod path;
pub mod session;
pub mod vertex_curve;
pub mod walk;
