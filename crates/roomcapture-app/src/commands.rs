use crate::cli::{Cli, Command};
use crate::error::{AppError, AppResult};
use kurbo::{Point, Size};
use roomcapture_core::{
    AutoSaveManager, CaptureConfig, CaptureSession, CaptureStore, DocumentStorage, DrawingId,
    FileStorage, NormalizedPoint, OwnerToken, ProjectId, to_normalized,
};
use std::path::Path;
use std::sync::Arc;

/// The loaded store plus the persistence that backs it.
struct Workspace {
    store: CaptureStore,
    autosave: AutoSaveManager<FileStorage>,
}

impl Workspace {
    async fn open(config: &CaptureConfig, owner: OwnerToken) -> AppResult<Self> {
        let data_dir = config.resolve_data_dir()?;
        log::info!("Using data directory {}", data_dir.display());

        let storage = Arc::new(FileStorage::new(data_dir)?);
        let documents: Arc<dyn DocumentStorage> = storage.clone();
        let mut store = CaptureStore::new(documents);
        let mut autosave = AutoSaveManager::new(storage, owner);
        autosave.set_interval(config.autosave_interval());

        let loaded = autosave.load(&mut store).await?;
        log::debug!("Loaded {} project(s)", loaded);
        store.poll_events();

        Ok(Self { store, autosave })
    }

    /// Persist every project touched since the last flush.
    async fn flush(&mut self) -> AppResult<()> {
        let events = self.store.poll_events();
        self.autosave.observe(&events);
        if self.autosave.is_dirty() {
            self.autosave.save(&self.store).await?;
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> AppResult<CaptureConfig> {
    let mut config = match &cli.config {
        Some(path) => CaptureConfig::load(path)?,
        None => CaptureConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Resolve a pin from command-line coordinates.
///
/// With a page size the coordinates are page points and are clamped onto
/// the page. Without one they must already be normalized.
fn pin_from_args(x: f64, y: f64, page: Option<Size>) -> AppResult<NormalizedPoint> {
    match page {
        Some(size) => Ok(to_normalized(Point::new(x, y), size)),
        None => NormalizedPoint::new(x, y).ok_or_else(|| {
            AppError::Usage(format!(
                "pin ({}, {}) is outside the page; pass --page-width/--page-height for page points",
                x, y
            ))
        }),
    }
}

fn resolve_drawing(
    store: &CaptureStore,
    project: ProjectId,
    drawing: Option<DrawingId>,
) -> AppResult<DrawingId> {
    if let Some(drawing) = drawing {
        return Ok(drawing);
    }
    store
        .active_drawing(project)
        .map(|d| d.id)
        .ok_or_else(|| AppError::Usage(format!("project {} has no active drawing", project)))
}

fn read_file(path: &Path) -> AppResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub async fn run(cli: Cli) -> AppResult<()> {
    let config = load_config(&cli)?;
    let mut ws = Workspace::open(&config, OwnerToken::new(cli.owner.clone())).await?;
    let store = &mut ws.store;

    match cli.command {
        Command::Projects => {
            for project in store.projects() {
                println!(
                    "{}  {}  foreman: {}  created {}",
                    project.id,
                    project.name,
                    project.foreman,
                    project.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::CreateProject { name, foreman } => {
            let project = store.create_project(&name, &foreman)?;
            println!("{}", project.id);
        }
        Command::DeleteProject { project } => {
            store.delete_project(project).await?;
        }
        Command::ImportDrawing {
            project,
            file,
            name,
        } => {
            let bytes = read_file(&file)?;
            let name = name.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            let drawing = store.add_drawing(&bytes, &name, project).await?;
            println!("{}", drawing.id);
        }
        Command::Drawings { project } => {
            let active = store.active_drawing(project).map(|d| d.id);
            for drawing in store.drawings_of(project) {
                let marker = if Some(drawing.id) == active { "*" } else { " " };
                println!("{} {}  {}  ({})", marker, drawing.id, drawing.name, drawing.document);
            }
        }
        Command::SetActive { project, drawing } => {
            store.set_active_drawing(project, drawing)?;
        }
        Command::DeleteDrawing { drawing } => {
            store.delete_drawing(drawing).await?;
        }
        Command::AddRoom {
            project,
            drawing,
            name,
            x,
            y,
            page_width,
            page_height,
            scan,
        } => {
            let drawing = resolve_drawing(store, project, drawing)?;
            let page = page_width.zip(page_height).map(|(w, h)| Size::new(w, h));
            let pin = pin_from_args(x, y, page)?;

            let mut session = CaptureSession::new(project, drawing);
            session.request_placement(pin);
            let room = session.submit_name(store, &name)?;
            println!("{}", room.id);

            if !scan.is_empty() {
                let ticket = session.begin_capture()?;
                if let Some(recorded) = session.complete_capture(store, ticket, scan)? {
                    println!("{}", recorded.id);
                }
            }
        }
        Command::Rooms { drawing } => {
            for room in store.rooms_of(drawing) {
                println!(
                    "{}  {}  ({:.4}, {:.4})  {} scan(s)",
                    room.id,
                    room.name,
                    room.pin_x(),
                    room.pin_y(),
                    store.scans_of(room.id).len()
                );
            }
        }
        Command::DeleteRoom { room } => {
            store.delete_room(room)?;
        }
        Command::AddScan {
            project,
            room,
            images,
            coverage_complete,
        } => {
            let scan = store.add_scan(project, room, images)?;
            if let Some(complete) = coverage_complete {
                store.set_coverage_complete(scan.id, complete)?;
            }
            println!("{}", scan.id);
        }
        Command::Report { project } => {
            let report = store.report(project)?;
            println!("{} ({})", report.project.name, report.project.foreman);
            for line in &report.rooms {
                println!(
                    "  {:<24} {:<20} {:>3} scan(s) {:>4} image(s)",
                    line.room.name, line.drawing_name, line.scan_count, line.image_count
                );
            }
            println!("  total scans: {}", report.total_scans());
        }
    }

    ws.flush().await
}
