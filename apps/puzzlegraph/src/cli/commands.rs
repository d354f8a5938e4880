//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use puzzlegraph_core::{
    Blueprint, BlueprintFormat, Graph, GraphMetrics, NodeId, PuzzleError, Query, QueryResult,
    QueryType, graph_from_bytes, graph_to_bytes, primitives::MAX_PERSISTENCE_PAYLOAD_SIZE,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for blueprints (16 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_BLUEPRINT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum file size for graph files, matching the decoder's own limit.
const MAX_GRAPH_FILE_SIZE: u64 = MAX_PERSISTENCE_PAYLOAD_SIZE as u64;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PuzzleError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PuzzleError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PuzzleError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PuzzleError> {
    let canonical = path.canonicalize().map_err(|e| {
        PuzzleError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PuzzleError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, PuzzleError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PuzzleError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PuzzleError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PuzzleError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty graph file.
pub fn cmd_init(graph_path: &Path, force: bool) -> Result<(), PuzzleError> {
    if graph_path.exists() && !force {
        return Err(PuzzleError::IoError(
            "Graph file already exists. Use --force to overwrite.".to_string(),
        ));
    }

    save_graph(&Graph::new(), graph_path)?;
    println!("Initialized new graph at {:?}", graph_path);

    Ok(())
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Build a graph from a blueprint file and save it.
pub fn cmd_load(
    graph_path: &Path,
    json_mode: bool,
    file: &Path,
    format: Option<&str>,
) -> Result<(), PuzzleError> {
    let format = match format {
        Some(f) => f.parse::<BlueprintFormat>()?,
        None => guess_format(file),
    };

    tracing::info!("Loading blueprint from {:?} (format: {})", file, format);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_BLUEPRINT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&validated_path)
        .map_err(|e| PuzzleError::IoError(format!("Read blueprint: {}", e)))?;

    let blueprint = Blueprint::parse(&text, format)?;
    let graph = blueprint.build()?;
    save_graph(&graph, graph_path)?;

    if json_mode {
        let output = serde_json::json!({
            "graph": graph_path.to_string_lossy(),
            "name": blueprint.name,
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
            "composite_keys": graph.composites().count()
        });
        print_json(&output);
        return Ok(());
    }

    println!(
        "Loaded {}: {} nodes, {} edges, {} composite keys",
        blueprint.name.as_deref().unwrap_or("blueprint"),
        graph.node_count(),
        graph.edge_count(),
        graph.composites().count()
    );

    Ok(())
}

fn guess_format(file: &Path) -> BlueprintFormat {
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => BlueprintFormat::Toml,
        _ => BlueprintFormat::Json,
    }
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the graph as a blueprint or a binary graph file.
pub fn cmd_export(graph_path: &Path, output: &Path, format: &str) -> Result<(), PuzzleError> {
    let graph = load_or_create_graph(graph_path)?;
    let validated_output = validate_output_path(output)?;

    let data = match format {
        "blueprint-json" | "json" => Blueprint::from_graph(&graph, None)
            .render(BlueprintFormat::Json)?
            .into_bytes(),
        "blueprint-toml" | "toml" => Blueprint::from_graph(&graph, None)
            .render(BlueprintFormat::Toml)?
            .into_bytes(),
        "binary" => graph_to_bytes(&graph)?,
        other => {
            return Err(PuzzleError::SerializationError(format!(
                "Unknown export format '{}'. Use: blueprint-json, blueprint-toml, binary",
                other
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| PuzzleError::IoError(format!("Write export: {}", e)))?;

    println!(
        "Exported {} nodes, {} edges to {:?} ({} bytes)",
        graph.node_count(),
        graph.edge_count(),
        output,
        data.len()
    );

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(graph_path: &Path, json_mode: bool) -> Result<(), PuzzleError> {
    let graph = load_or_create_graph(graph_path)?;
    let metrics = GraphMetrics::from_graph(&graph)?;

    if json_mode {
        let output = serde_json::json!({
            "graph": graph_path.to_string_lossy(),
            "metrics": metrics
        });
        print_json(&output);
        return Ok(());
    }

    println!("puzzlegraph Status");
    println!("==================");
    println!("Graph: {:?}", graph_path);
    println!();
    println!("Nodes:          {}", metrics.node_count);
    println!("  Puzzles:      {}", metrics.puzzles);
    println!("  Locks:        {}", metrics.locks);
    println!("  Keys:         {}", metrics.keys);
    println!("  Spaces:       {}", metrics.locked_spaces);
    println!("Edges:          {}", metrics.edge_count);
    println!("  Dependency:   {}", metrics.dependency_edges);
    println!("  Containment:  {}", metrics.containment_edges);
    println!("Composite keys: {}", metrics.composite_keys);
    println!("Roots / leaves: {} / {}", metrics.roots, metrics.leaves);
    println!("Depth:          {}", metrics.depth);

    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Print a solving order, optionally grouped into layers.
pub fn cmd_order(graph_path: &Path, json_mode: bool, layers: bool) -> Result<(), PuzzleError> {
    let query = if layers {
        Query::new(QueryType::Layers)
    } else {
        Query::topological_order()
    };
    run_query(graph_path, json_mode, "order", &query)
}

/// Everything downstream of a node.
pub fn cmd_reach(graph_path: &Path, json_mode: bool, id: &str) -> Result<(), PuzzleError> {
    run_query(graph_path, json_mode, "reachable", &Query::reachable_from(id))
}

/// Everything upstream of a node.
pub fn cmd_prereqs(graph_path: &Path, json_mode: bool, id: &str) -> Result<(), PuzzleError> {
    run_query(
        graph_path,
        json_mode,
        "prerequisites",
        &Query::prerequisites_of(id),
    )
}

/// Direct containment children of a space.
pub fn cmd_contents(graph_path: &Path, json_mode: bool, id: &str) -> Result<(), PuzzleError> {
    let query = Query::new(QueryType::ContentsOf(NodeId::from(id)));
    run_query(graph_path, json_mode, "contents", &query)
}

/// Check whether a key is satisfied by the held keys.
pub fn cmd_satisfied(
    graph_path: &Path,
    json_mode: bool,
    key: &str,
    held: &[String],
) -> Result<(), PuzzleError> {
    let graph = load_or_create_graph(graph_path)?;
    let held = id_set(held);
    let result = Query::is_satisfied(key, held.clone()).execute(&graph)?;
    let satisfied = matches!(result, QueryResult::Bool(true));

    if json_mode {
        let output = serde_json::json!({
            "key": key,
            "held": held,
            "satisfied": satisfied,
            "parts": graph.composite_parts(key)
        });
        print_json(&output);
        return Ok(());
    }

    let verdict = if satisfied { "satisfied" } else { "not satisfied" };
    println!("{} is {}", key, verdict);
    if let Some(parts) = graph.composite_parts(key) {
        let missing: Vec<&str> = parts.difference(&held).map(NodeId::as_str).collect();
        if !missing.is_empty() {
            println!("Missing parts: {}", missing.join(", "));
        }
    }

    Ok(())
}

/// List nodes that can be resolved next.
pub fn cmd_accessible(
    graph_path: &Path,
    json_mode: bool,
    resolved: &[String],
) -> Result<(), PuzzleError> {
    let graph = load_or_create_graph(graph_path)?;
    let resolved = id_set(resolved);

    if let Some(unknown) = resolved.iter().find(|id| !graph.contains_node(id)) {
        return Err(PuzzleError::NodeNotFound(unknown.clone()));
    }

    let result = Query::new(QueryType::Accessible(resolved)).execute(&graph)?;
    if !json_mode && matches!(&result, QueryResult::Sequence(ids) if ids.is_empty()) {
        println!("Nothing left to resolve");
        return Ok(());
    }

    print_result(&graph, json_mode, "accessible", &result);
    Ok(())
}

fn run_query(
    graph_path: &Path,
    json_mode: bool,
    label: &str,
    query: &Query,
) -> Result<(), PuzzleError> {
    let graph = load_or_create_graph(graph_path)?;

    tracing::debug!("Executing query: {:?}", query.query_type);
    let result = query.execute(&graph)?;

    print_result(&graph, json_mode, label, &result);
    Ok(())
}

fn print_result(graph: &Graph, json_mode: bool, label: &str, result: &QueryResult) {
    if json_mode {
        let mut output = serde_json::Map::new();
        output.insert(label.to_string(), serde_json::json!(result));
        print_json(&serde_json::Value::Object(output));
        return;
    }

    match result {
        QueryResult::Sequence(ids) => {
            for (step, id) in ids.iter().enumerate() {
                println!("{:>3}. {}", step + 1, describe(graph, id));
            }
        }
        QueryResult::Set(ids) => {
            println!("{} ({}):", label, ids.len());
            for id in ids {
                println!("  - {}", describe(graph, id));
            }
        }
        QueryResult::Layers(layers) => {
            for (depth, layer) in layers.iter().enumerate() {
                let names: Vec<&str> = layer.iter().map(NodeId::as_str).collect();
                println!("Layer {}: {}", depth, names.join(", "));
            }
        }
        QueryResult::Bool(answer) => println!("{}: {}", label, answer),
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load a graph file, or start an empty graph if it does not exist.
pub fn load_or_create_graph(graph_path: &Path) -> Result<Graph, PuzzleError> {
    if !graph_path.exists() {
        tracing::debug!("No graph at {:?}, starting empty", graph_path);
        return Ok(Graph::new());
    }

    validate_file_size(graph_path, MAX_GRAPH_FILE_SIZE)?;
    let data = std::fs::read(graph_path)
        .map_err(|e| PuzzleError::IoError(format!("Read graph: {}", e)))?;

    graph_from_bytes(&data)
}

/// Save a graph to a graph file.
pub fn save_graph(graph: &Graph, graph_path: &Path) -> Result<(), PuzzleError> {
    let data = graph_to_bytes(graph)?;
    std::fs::write(graph_path, &data)
        .map_err(|e| PuzzleError::IoError(format!("Write graph: {}", e)))?;

    tracing::debug!("Saved {} bytes to {:?}", data.len(), graph_path);
    Ok(())
}

pub(crate) fn describe(graph: &Graph, id: &NodeId) -> String {
    match graph.node(id) {
        Some(node) => format!("{} [{}] {}", node.id, node.kind, node.name),
        None => id.to_string(),
    }
}

pub(crate) fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn id_set(ids: &[String]) -> BTreeSet<NodeId> {
    ids.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(NodeId::from)
        .collect()
}
