use coopsweeper_client::{
    Board, CellKind, ClientConfig, GameEvent, Intent, Mark, MultiplayerGame, Pos,
};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Relay address, seed and board come from COOPSWEEPER_* variables
    let config = ClientConfig::from_env();
    let (width, height) = (config.game.width, config.game.height);
    let mut game = MultiplayerGame::connect(config).await?;
    println!("Connected with seed {}", game.session().seed());

    let mut event_receiver = game.subscribe_to_events();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                GameEvent::BoardReset { seed } => println!("🔄 Peer announced seed {}", seed),
                GameEvent::PhaseChanged { phase } => println!("🎮 Phase is now {:?}", phase),
                GameEvent::NetworkTimeout => println!("⏱️  Relay did not answer in time"),
                GameEvent::GenerationExhausted { attempts } => {
                    println!("🎲 Gave up on the first cell after {} tries", attempts)
                }
                GameEvent::ConnectionLost => {
                    println!("🔌 Connection lost!");
                    break;
                }
            }
        }
    });

    let (intents, intent_receiver) = mpsc::unbounded_channel();
    let (snapshots, snapshot_receiver) = watch::channel(game.snapshot());
    let tick_loop = tokio::spawn(game.run(intent_receiver, snapshots));

    // Poke at random cells until the game ends
    let mut rng = rand::rng();
    for _ in 0..40 {
        let pos = Pos::new(rng.random_range(0..width), rng.random_range(0..height));
        let intent = if rng.random_bool(0.2) {
            Intent::ToggleMark { pos }
        } else {
            Intent::Open { pos }
        };
        println!("{:?}", intent);
        if intents.send(intent).is_err() {
            break;
        }

        sleep(Duration::from_millis(250)).await;
        if snapshot_receiver.borrow().phase.is_finished() {
            break;
        }
    }

    let snapshot = snapshot_receiver.borrow().clone();
    println!("\nFinal board, phase {:?}:", snapshot.phase);
    display_board(&snapshot.board);

    drop(intents);
    tick_loop.await??;
    event_handler.abort();
    let _ = event_handler.await;

    Ok(())
}

fn display_board(board: &Board) {
    for (y, row) in board.rows().enumerate() {
        print!("  ");
        for cell in row {
            let symbol = match (cell.revealed, cell.mark, cell.kind) {
                (false, Mark::Flagged, _) => "F".to_string(),
                (false, Mark::Questioned, _) => "?".to_string(),
                (false, _, _) => "·".to_string(),
                (true, _, CellKind::Blank) => " ".to_string(),
                (true, _, CellKind::Numbered) => cell.adjacent.to_string(),
                (true, _, CellKind::Mine) => "*".to_string(),
                (true, _, CellKind::DetonatedMine) => "X".to_string(),
            };
            print!("{:>2}", symbol);
        }
        println!("  {}", y);
    }

    print!("  ");
    for x in 0..board.width() {
        print!("{:>2}", x % 10);
    }
    println!();
}
